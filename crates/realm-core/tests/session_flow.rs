//! Integration tests for sessions driven through the tick loop.
//!
//! Each test loads a small world from YAML content, connects clients over
//! channel connections, and inspects what those clients receive.

// Integration tests use unwrap extensively for clarity -- panicking on
// failure is the correct behavior in test code.
#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use realm_core::config::WorldConfig;
use realm_core::{ChannelConnection, Content, Outbound, RealmError, World, run_tick};
use realm_types::{ClientCommand, LogItem, NetworkId, ServerMessage, SessionId, Vec2};
use realm_world::{ActionEffect, AreaLinkData, WorldError};
use serde_json::json;
use tokio::sync::mpsc::UnboundedReceiver;

const ENTITIES: &str = r"
player: { kind: player, speed: 4.0, damage: 1 }
elder: { kind: npc, actions: [talk], dialog: Welcome. }
wolf: { kind: enemy, health: 2, actions: [attack] }
cave_door:
  kind: areaLink
  actions: [link]
  link: { target_area: cave, target_link: enter_cave }
loop_door:
  kind: areaLink
  actions: [link]
  link: { target_area: start, target_link: far_end }
";

const AREAS: &str = r"
- name: start
  walls: [[0, 0, 0, 0, 0]]
  links:
    - { type: enter_start, x: 0, y: 0 }
    - { type: far_end, x: 3, y: 0 }
  entities:
    - { type: elder, name: Elder, x: 2, y: 0 }
    - { type: loop_door, name: Loop, x: 1, y: 0 }
    - { type: cave_door, name: Cave, x: 4, y: 0 }
- name: cave
  walls: [[0, 0, 0]]
  links: [{ type: enter_cave, x: 0, y: 0 }]
  entities:
    - { type: wolf, name: Wolf, x: 2, y: 0 }
";

const STORY: &str = r"
messages:
  - key: explorer
    title: Explorer
    text: You found the cave.
    conditions:
      - { type: enterArea, target: cave }
quests:
  - key: wolves
    title: Wolf trouble
    text: The village has a wolf problem.
    stages:
      - key: requirements
        text: Find the elder
        conditions:
          - { type: talk, target: Elder, text: Talk to the elder }
      - key: hunt
        text: Deal with the wolf
        conditions:
          - { type: kill, target: Wolf, text: Kill the wolf }
";

fn make_world() -> World {
    let content = Content::parse(ENTITIES, AREAS, STORY).unwrap();
    let areas = content.build_areas().unwrap();
    World::new(WorldConfig::default(), content.catalog, content.story, areas).unwrap()
}

fn connect(world: &mut World, name: &str) -> (SessionId, UnboundedReceiver<Outbound>) {
    let (conn, rx) = ChannelConnection::new();
    let id = world.connect_user(name, Box::new(conn)).unwrap();
    (id, rx)
}

fn drain(rx: &mut UnboundedReceiver<Outbound>) -> Vec<Outbound> {
    let mut out = Vec::new();
    while let Ok(item) = rx.try_recv() {
        out.push(item);
    }
    out
}

fn messages(rx: &mut UnboundedReceiver<Outbound>) -> Vec<ServerMessage> {
    drain(rx)
        .into_iter()
        .filter_map(|item| match item {
            Outbound::Message(message) => Some(message),
            Outbound::Close => None,
        })
        .collect()
}

fn entity_named(world: &World, area: &str, name: &str) -> NetworkId {
    world
        .area(area)
        .unwrap()
        .registry()
        .live()
        .find(|e| e.name == name)
        .and_then(realm_world::Entity::network_id)
        .unwrap()
}

fn command(world: &mut World, session: SessionId, action: &str, target: serde_json::Value) {
    assert!(world.enqueue_command(
        session,
        ClientCommand {
            action: action.into(),
            target,
        }
    ));
}

/// Run ticks until `done` holds, collecting everything `rx` receives.
fn run_until(
    world: &mut World,
    rx: &mut UnboundedReceiver<Outbound>,
    mut done: impl FnMut(&[ServerMessage]) -> bool,
) -> Vec<ServerMessage> {
    let mut received = Vec::new();
    for _ in 0..200 {
        run_tick(world).unwrap();
        received.extend(messages(rx));
        if done(&received) {
            return received;
        }
    }
    panic!("condition not reached; received {received:?}");
}

fn quest_completed(message: &ServerMessage) -> Option<bool> {
    match message {
        ServerMessage::LogUpdate {
            item: LogItem::Quest(view),
        } => Some(view.completed),
        _ => None,
    }
}

#[test]
fn ready_sends_area_then_log_then_player() {
    let mut world = make_world();
    let (ada, mut rx) = connect(&mut world, "ada");
    assert!(drain(&mut rx).is_empty());

    world.ready(ada).unwrap();
    let received = messages(&mut rx);
    let kinds: Vec<&str> = received.iter().map(ServerMessage::kind).collect();
    assert_eq!(kinds, vec!["areaData", "logData", "player"]);

    let ServerMessage::LogData { quests, messages } = &received[1] else {
        panic!("expected log data");
    };
    assert_eq!(quests.len(), 1);
    assert!(messages.is_empty());

    let ServerMessage::Player { entity } = &received[2] else {
        panic!("expected player");
    };
    assert_eq!(
        entity.nid,
        world.character_of(ada).and_then(realm_world::Entity::network_id)
    );
}

#[test]
fn users_see_each_other_arrive_and_leave() {
    let mut world = make_world();
    let (ada, mut ada_rx) = connect(&mut world, "ada");
    world.ready(ada).unwrap();
    drain(&mut ada_rx);

    let (bob, mut bob_rx) = connect(&mut world, "bob");
    let bob_character = world.session(bob).unwrap().character;
    let received = messages(&mut ada_rx);
    assert!(matches!(
        received.as_slice(),
        [ServerMessage::Add { entity }] if entity.nid == Some(bob_character)
    ));

    world.ready(bob).unwrap();
    let ServerMessage::AreaData { entities, .. } = &messages(&mut bob_rx)[0] else {
        panic!("expected area data");
    };
    let ada_character = world.session(ada).unwrap().character;
    assert!(entities.iter().any(|e| e.nid == Some(ada_character)));

    world.disconnect_user(bob).unwrap();
    assert_eq!(
        messages(&mut ada_rx),
        vec![ServerMessage::Remove {
            network_id: bob_character
        }]
    );
    assert_eq!(world.session_count(), 1);
    assert!(matches!(
        world.disconnect_user(bob),
        Err(RealmError::UnknownSession(id)) if id == bob
    ));

    run_tick(&mut world).unwrap();
    let start = world.area("start").unwrap();
    assert!(start.registry().get_by_id(bob_character).is_none());
}

#[test]
fn quest_runs_from_talk_through_door_to_kill() {
    let mut world = make_world();
    let (ada, mut rx) = connect(&mut world, "ada");
    world.ready(ada).unwrap();
    drain(&mut rx);

    // Talk to the elder: the first stage completes and the next is revealed.
    let elder = entity_named(&world, "start", "Elder");
    command(&mut world, ada, "talk", json!(elder));
    let received = run_until(&mut world, &mut rx, |m| {
        m.iter().any(|m| matches!(m, ServerMessage::Dialog { .. }))
    });
    let ServerMessage::LogUpdate {
        item: LogItem::Quest(quest),
    } = &received[0]
    else {
        panic!("expected quest update, got {received:?}");
    };
    assert_eq!(quest.stages.len(), 2);
    assert!(!quest.completed);
    assert_eq!(
        received[1],
        ServerMessage::Dialog {
            title: Some("Elder".into()),
            text: "Welcome.".into()
        }
    );
    assert!(world.session(ada).unwrap().open_dialog.is_some());

    command(&mut world, ada, "close", json!(null));
    run_tick(&mut world).unwrap();
    assert!(world.session(ada).unwrap().open_dialog.is_none());

    // Walk through the door into the cave.
    let door = entity_named(&world, "start", "Cave");
    command(&mut world, ada, "link", json!(door));
    let received = run_until(&mut world, &mut rx, |m| {
        m.iter().any(|m| matches!(m, ServerMessage::Player { .. }))
    });
    let kinds: Vec<&str> = received.iter().map(ServerMessage::kind).collect();
    assert_eq!(
        kinds,
        vec!["areaData", "logData", "player", "dialog", "logUpdate"]
    );
    assert!(matches!(
        &received[4],
        ServerMessage::LogUpdate {
            item: LogItem::Message(m)
        } if m.key == "explorer"
    ));
    assert_eq!(world.session(ada).unwrap().area, "cave");
    let character = world.character_of(ada).unwrap();
    assert!(character.position.is_in_range(Vec2::ZERO, 1e-9));

    // Kill the wolf: the quest completes and the wolf leaves the area.
    let wolf = entity_named(&world, "cave", "Wolf");
    command(&mut world, ada, "attack", json!(wolf));
    let received = run_until(&mut world, &mut rx, |m| {
        m.iter().any(|m| quest_completed(m) == Some(true))
    });
    assert!(received.contains(&ServerMessage::Remove { network_id: wolf }));
    assert_eq!(
        received.iter().filter_map(quest_completed).collect::<Vec<_>>(),
        vec![true]
    );
    run_tick(&mut world).unwrap();
    assert!(world.area("cave").unwrap().registry().get_by_id(wolf).is_none());
}

#[test]
fn unknown_command_closes_the_connection() {
    let mut world = make_world();
    let (ada, mut ada_rx) = connect(&mut world, "ada");
    let (bob, mut bob_rx) = connect(&mut world, "bob");
    world.ready(ada).unwrap();
    drain(&mut ada_rx);
    drain(&mut bob_rx);
    let bob_character = world.session(bob).unwrap().character;

    command(&mut world, bob, "dance", json!(null));
    let summary = run_tick(&mut world).unwrap();

    assert_eq!(summary.commands.closed, 1);
    assert_eq!(drain(&mut bob_rx), vec![Outbound::Close]);
    assert_eq!(
        messages(&mut ada_rx),
        vec![ServerMessage::Remove {
            network_id: bob_character
        }]
    );
    assert!(world.session(bob).is_none());
    assert_eq!(summary.sessions, 1);
    assert_eq!(summary.entities_removed, 1);
}

#[test]
fn malformed_target_is_dropped_without_closing() {
    let mut world = make_world();
    let (ada, mut rx) = connect(&mut world, "ada");

    command(&mut world, ada, "talk", json!("not-an-id"));
    command(&mut world, ada, "attack", json!(NetworkId::new()));
    let summary = run_tick(&mut world).unwrap();

    assert_eq!(summary.commands.rejected, 2);
    assert_eq!(summary.commands.closed, 0);
    assert!(drain(&mut rx).is_empty());
    assert!(world.session(ada).is_some());
}

#[test]
fn door_into_the_same_area_moves_the_player_in_place() {
    let mut world = make_world();
    let (ada, mut ada_rx) = connect(&mut world, "ada");
    let (bob, mut bob_rx) = connect(&mut world, "bob");
    world.ready(ada).unwrap();
    world.ready(bob).unwrap();
    drain(&mut ada_rx);
    drain(&mut bob_rx);
    let ada_character = world.session(ada).unwrap().character;

    let door = entity_named(&world, "start", "Loop");
    command(&mut world, ada, "link", json!(door));
    let received = run_until(&mut world, &mut ada_rx, |m| {
        m.iter().any(|m| matches!(m, ServerMessage::Player { .. }))
    });

    let kinds: Vec<&str> = received.iter().map(ServerMessage::kind).collect();
    assert_eq!(kinds, vec!["areaData", "logData", "player"]);
    let seen_by_bob: Vec<&str> = messages(&mut bob_rx).iter().map(ServerMessage::kind).collect();
    assert_eq!(seen_by_bob, vec!["remove", "add"]);

    run_tick(&mut world).unwrap();
    assert_eq!(world.session(ada).unwrap().area, "start");
    let character = world.character_of(ada).unwrap();
    assert_eq!(character.network_id(), Some(ada_character));
    assert!(!character.is_removed());
    assert!(character.position.is_in_range(Vec2::new(3.0, 0.0), 1e-9));
    assert_eq!(world.session_count(), 2);
}

#[test]
fn failed_transition_leaves_the_player_and_the_tick_intact() {
    let mut world = make_world();
    let (ada, mut rx) = connect(&mut world, "ada");
    let character = world.session(ada).unwrap().character;

    world.apply_effects(
        "start",
        vec![ActionEffect::Transition {
            owner: ada,
            actor: character,
            link: AreaLinkData {
                target_area: "nowhere".into(),
                target_link: "enter_nowhere".into(),
            },
        }],
    );

    let summary = run_tick(&mut world).unwrap();
    assert_eq!(summary.sessions, 1);
    assert_eq!(world.session(ada).unwrap().area, "start");
    assert!(!world.character_of(ada).unwrap().is_removed());
    assert!(drain(&mut rx).is_empty());
}

#[test]
fn dangling_area_link_fails_at_startup() {
    let entities = format!(
        "{ENTITIES}\nbroken_door: {{ kind: areaLink, link: {{ target_area: nowhere, target_link: x }} }}\n"
    );
    let areas = "
- name: start
  walls: [[0, 0]]
  links: [{ type: enter_start, x: 0, y: 0 }]
  entities: [{ type: broken_door, name: Broken, x: 1, y: 0 }]
";
    let content = Content::parse(&entities, areas, STORY).unwrap();
    let built = content.build_areas().unwrap();
    let err = World::new(WorldConfig::default(), content.catalog, content.story, built).unwrap_err();
    assert!(matches!(
        err,
        RealmError::World {
            source: WorldError::AreaNotFound(name)
        } if name == "nowhere"
    ));

    let areas = "
- name: start
  walls: [[0, 0]]
  links: [{ type: enter_start, x: 0, y: 0 }]
  entities: [{ type: loop_door, name: Loop, x: 1, y: 0 }]
";
    let content = Content::parse(ENTITIES, areas, STORY).unwrap();
    let built = content.build_areas().unwrap();
    let err = World::new(WorldConfig::default(), content.catalog, content.story, built).unwrap_err();
    assert!(matches!(
        err,
        RealmError::World {
            source: WorldError::LinkNotFound { link, .. }
        } if link == "far_end"
    ));
}
