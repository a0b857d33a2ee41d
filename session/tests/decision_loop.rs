use std::time::Duration;

use tile_skirmish_core::{
    AgentConfig, AgentId, AgentKind, AgentState, AttackOutcome, Combatant, Direction, Event, Health,
    PathfindTarget, PlayerConfig, Tile, WanderAnchor, WanderConfig,
};
use tile_skirmish_session::{Session, SessionConfig, SessionError};
use tile_skirmish_world::{MapError, TextMap, TileTags};

fn open_rows(width: usize, height: usize) -> Vec<String> {
    vec![".".repeat(width); height]
}

fn session_with_map(rows: &[String]) -> Session {
    let mut session = Session::new(SessionConfig::default()).expect("session");
    let map = TextMap::parse(rows, TileTags::default()).expect("map");
    let _ = session.on_map_load(&map).expect("load");
    session
}

fn hunter(kind: AgentKind, radius: u32, attack: i32) -> AgentConfig {
    let mut config = AgentConfig::new(kind);
    config.perception_radius = Some(radius);
    config.attack = attack;
    config
}

fn millis(value: u64) -> Duration {
    Duration::from_millis(value)
}

fn moves_of(events: &[Event], agent: AgentId) -> Vec<Tile> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::AgentMoved { agent: mover, to, .. } if *mover == agent => Some(*to),
            _ => None,
        })
        .collect()
}

#[test]
fn enemy_acquires_closes_in_and_strikes() {
    let mut session = session_with_map(&open_rows(10, 10));
    let enemy = session
        .register_agent(hunter(AgentKind::Enemy, 5, 2), Tile::new(0, 0), Direction::East)
        .expect("enemy");
    session
        .place_player(PlayerConfig::default(), Tile::new(3, 0), Direction::West)
        .expect("player");
    assert_eq!(session.agent_state(enemy), Some(AgentState::Idle));

    let first = session.tick(Duration::ZERO);
    assert!(first.contains(&Event::PathfindTargetChanged {
        agent: enemy,
        target: Some(PathfindTarget::Player),
    }));
    assert_eq!(moves_of(&first, enemy), vec![Tile::new(1, 0)]);
    assert_eq!(session.agent_state(enemy), Some(AgentState::Seeking));

    let second = session.tick(millis(500));
    assert_eq!(moves_of(&second, enemy), vec![Tile::new(2, 0)]);
    assert_eq!(session.agent_state(enemy), Some(AgentState::Engaging));
    assert_eq!(session.agent_state(AgentId::new(99)), None);
    assert!(second.contains(&Event::AttackResolved {
        attacker: Combatant::Agent(enemy),
        target: Combatant::Player,
        outcome: AttackOutcome::Damaged {
            remaining: Health::new(18)
        },
    }));

    let cooling = session.tick(millis(1_000));
    assert!(cooling.is_empty(), "unexpected events {cooling:?}");

    let third = session.tick(millis(1_500));
    assert!(third.contains(&Event::AttackResolved {
        attacker: Combatant::Agent(enemy),
        target: Combatant::Player,
        outcome: AttackOutcome::Damaged {
            remaining: Health::new(16)
        },
    }));
    assert_eq!(
        session.player().map(|player| player.health),
        Some(Health::new(16))
    );
}

#[test]
fn sight_blocking_terrain_hides_the_player() {
    let rows: Vec<String> = (0..5).map(|_| String::from("..~..")).collect();
    let mut session = session_with_map(&rows);
    let enemy = session
        .register_agent(hunter(AgentKind::Enemy, 5, 1), Tile::new(0, 0), Direction::East)
        .expect("enemy");
    session
        .place_player(PlayerConfig::default(), Tile::new(4, 0), Direction::West)
        .expect("player");

    assert!(!session.has_line_of_sight(enemy, Tile::new(4, 0)));
    assert!(session.has_line_of_sight(enemy, Tile::new(1, 0)));

    let events = session.tick(Duration::ZERO);
    assert!(events.is_empty(), "unexpected events {events:?}");
    let snapshot = session.agents().get(enemy).cloned().expect("enemy");
    assert_eq!(snapshot.pathfind_target, None);
}

#[test]
fn chaser_returns_to_idle_when_its_quarry_dies() {
    let mut session = session_with_map(&open_rows(6, 3));
    let battler = session
        .register_agent(hunter(AgentKind::Battler, 5, 0), Tile::new(0, 0), Direction::East)
        .expect("battler");
    let mut frail = AgentConfig::new(AgentKind::Enemy);
    frail.health = 1;
    let enemy = session
        .register_agent(frail, Tile::new(3, 0), Direction::West)
        .expect("enemy");
    session
        .place_player(PlayerConfig::default(), Tile::new(4, 0), Direction::West)
        .expect("player");

    let first = session.tick(Duration::ZERO);
    assert!(first.contains(&Event::PathfindTargetChanged {
        agent: battler,
        target: Some(PathfindTarget::Agent(enemy)),
    }));

    let strike = session.player_attack(millis(100));
    assert!(strike.contains(&Event::AgentDied {
        agent: enemy,
        kind: AgentKind::Enemy,
    }));

    let next = session.tick(millis(500));
    assert!(next.contains(&Event::PathfindTargetChanged {
        agent: battler,
        target: None,
    }));
    let snapshot = session.agents().get(battler).cloned().expect("battler");
    assert_eq!(snapshot.pathfind_target, None);
}

#[test]
fn idle_chaser_resumes_wandering_after_losing_its_quarry() {
    let mut session = session_with_map(&open_rows(7, 5));
    let wander = WanderConfig {
        radius: 2,
        interval_steps: 2,
        anchor: WanderAnchor::Spawn,
    };
    let mut config = hunter(AgentKind::Battler, 5, 0);
    config.wander = Some(wander);
    let battler = session
        .register_agent(config, Tile::new(1, 2), Direction::East)
        .expect("battler");
    let mut frail = AgentConfig::new(AgentKind::Enemy);
    frail.health = 1;
    let enemy = session
        .register_agent(frail, Tile::new(3, 2), Direction::West)
        .expect("enemy");
    session
        .place_player(PlayerConfig::default(), Tile::new(4, 2), Direction::West)
        .expect("player");

    let first = session.tick(Duration::ZERO);
    assert!(first.contains(&Event::PathfindTargetChanged {
        agent: battler,
        target: Some(PathfindTarget::Agent(enemy)),
    }));
    assert!(session
        .player_attack(millis(100))
        .contains(&Event::AgentDied {
            agent: enemy,
            kind: AgentKind::Enemy,
        }));

    let cleared = session.tick(millis(500));
    assert!(cleared.contains(&Event::PathfindTargetChanged {
        agent: battler,
        target: None,
    }));

    let wandered = (1..=u64::from(wander.interval_steps)).any(|step| {
        session
            .tick(millis(500 + step * 500))
            .iter()
            .any(|event| {
                matches!(
                    event,
                    Event::PathfindTargetChanged {
                        agent,
                        target: Some(PathfindTarget::Tile(_)),
                    } if *agent == battler
                )
            })
    });
    assert!(wandered, "no wander target within {} decision ticks", wander.interval_steps);
}

#[test]
fn decisions_follow_the_pathfinding_cadence() {
    let mut session = session_with_map(&open_rows(12, 1));
    let scout = session
        .register_agent(hunter(AgentKind::Battler, 12, 0), Tile::new(0, 0), Direction::East)
        .expect("scout");
    let _ = session
        .register_agent(AgentConfig::new(AgentKind::Enemy), Tile::new(11, 0), Direction::West)
        .expect("lure");

    let steps_per_tick: Vec<usize> = [0, 200, 499, 500, 900, 1_000]
        .into_iter()
        .map(|now| moves_of(&session.tick(millis(now)), scout).len())
        .collect();

    assert_eq!(steps_per_tick, vec![1, 0, 0, 1, 0, 1]);
    let snapshot = session.agents().get(scout).cloned().expect("scout");
    assert_eq!(snapshot.tile, Tile::new(3, 0));
}

#[test]
fn alerts_pull_enemies_toward_the_noise() {
    let mut session = session_with_map(&open_rows(10, 10));
    let enemy = session
        .register_agent(hunter(AgentKind::Enemy, 4, 1), Tile::new(0, 5), Direction::West)
        .expect("enemy");
    let origin = Tile::new(6, 5);

    session.raise_alert(origin, Duration::ZERO);

    let mut moves = Vec::new();
    for step in 0..4 {
        let events = session.tick(millis(step * 500));
        moves.extend(moves_of(&events, enemy));
    }

    let snapshot = session.agents().get(enemy).cloned().expect("enemy");
    assert_eq!(snapshot.pathfind_target, Some(PathfindTarget::Tile(origin)));
    assert!(!moves.is_empty());
    assert!(moves.iter().all(|tile| tile.y() == 5));
}

#[test]
fn distance_maps_are_cached_per_map_lifetime() {
    let mut session = session_with_map(&open_rows(5, 5));
    let target = Tile::new(4, 4);

    let first = session.distance_map(target).clone();
    let second = session.distance_map(target).clone();
    assert_eq!(first, second);
    assert_eq!(first.distance(Tile::new(0, 0)), Some(8));
    assert_eq!(session.distance_map_builds(), 1);

    let map = TextMap::parse(&open_rows(3, 3), TileTags::default()).expect("map");
    let events = session.on_map_load(&map).expect("reload");
    assert_eq!(events, vec![Event::MapLoaded { width: 3, height: 3 }]);
    assert_eq!(session.distance_map_builds(), 0);
    assert_eq!(session.distance_map(Tile::new(2, 2)).distance(Tile::new(0, 0)), Some(4));
}

#[test]
fn precomputed_maps_cover_open_tiles() {
    let config = SessionConfig {
        precompute_distance_maps: true,
        ..SessionConfig::default()
    };
    let mut session = Session::new(config).expect("session");
    let map = TextMap::parse(&[".#.", "..."], TileTags::default()).expect("map");

    let _ = session.on_map_load(&map).expect("load");

    assert_eq!(session.distance_map_builds(), 5);
    let _ = session.distance_map(Tile::new(0, 0));
    assert_eq!(session.distance_map_builds(), 5);
}

#[test]
fn setup_failures_are_reported() {
    let config = SessionConfig {
        pathfinding_step_ms: 0,
        ..SessionConfig::default()
    };
    assert_eq!(
        Session::new(config).unwrap_err(),
        SessionError::ZeroPathfindingStep
    );

    let mut session = Session::new(SessionConfig::default()).expect("session");
    let empty: [&str; 0] = [];
    let map = TextMap::parse(&empty, TileTags::default()).expect("map");
    assert_eq!(
        session.on_map_load(&map).unwrap_err(),
        SessionError::Map(MapError::Empty {
            width: 0,
            height: 0
        })
    );

    let map = TextMap::parse(&[".#"], TileTags::default()).expect("map");
    let _ = session.on_map_load(&map).expect("load");
    assert!(matches!(
        session.register_agent(AgentConfig::new(AgentKind::Enemy), Tile::new(1, 0), Direction::North),
        Err(SessionError::PlacementRejected { .. })
    ));
}
