use serde_json::{json, Value};
use tokio::sync::mpsc;
use warp::ws::Message;

use triad_chat::config::ServerConfig;
use triad_chat::core::registration::{
    ACCOUNT_INCOMPLETE, EMAIL_INVALID, NICKNAME_TAKEN, NICKNAME_TOO_LONG, NICKNAME_TOO_SHORT,
};
use triad_chat::core::state::ChatState;
use triad_chat::core::tiers::Tier;

struct Peer {
    id: String,
    rx: mpsc::UnboundedReceiver<Message>,
}

impl Peer {
    /// Every record queued for this peer so far
    fn drain(&mut self) -> Vec<Value> {
        let mut out = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            out.push(serde_json::from_str(msg.to_str().unwrap()).unwrap());
        }
        out
    }

    fn drain_type(&mut self, kind: &str) -> Vec<Value> {
        self.drain().into_iter().filter(|v| v["type"] == kind).collect()
    }
}

fn state() -> ChatState {
    ChatState::new(&ServerConfig::default())
}

fn connect(state: &mut ChatState, id: &str) -> Peer {
    let (tx, rx) = mpsc::unbounded_channel();
    state.register(id.to_string(), tx).unwrap();
    Peer { id: id.to_string(), rx }
}

fn create(state: &mut ChatState, peer: &Peer, nickname: &str) {
    state
        .create_account(
            &peer.id,
            Some(json!(nickname)),
            Some(json!(format!("{}@example.com", nickname.trim()))),
        )
        .unwrap();
}

fn rooms_of(state: &ChatState, id: &str) -> Vec<String> {
    state.sessions().get(id).unwrap().rooms.clone()
}

#[test]
fn test_account_creation_assigns_room_and_profile() {
    let mut state = state();
    let mut bob = connect(&mut state, "1");
    create(&mut state, &bob, "  Bob ");

    let created = bob.drain_type("account:created");
    assert_eq!(created.len(), 1);
    assert_eq!(created[0]["validates"], true);
    assert_eq!(created[0]["slug"], "bob");
    assert_eq!(created[0]["roommates"], json!([]));
    assert!(created[0]["avatar"].as_str().unwrap().contains("gravatar.com/avatar/"));
    assert!(created[0]["timeleft"].as_u64().unwrap() > 0);

    let client = state.sessions().get("1").unwrap();
    assert_eq!(client.nickname.as_deref(), Some("bob"));
    assert_eq!(client.rooms.len(), 1);
    assert!(client.details.connected.is_some());
    assert_eq!(state.stats().users, 1);
    assert_eq!(state.stats().rooms, 1);
}

#[test]
fn test_duplicate_nickname_is_rejected() {
    let mut state = state();
    let mut first = connect(&mut state, "1");
    let mut second = connect(&mut state, "2");
    create(&mut state, &first, "bob");
    first.drain();

    state.validate_check("2", Some(json!("nickname")), Some(json!("bob")));
    let check = second.drain_type("check:nickname");
    assert_eq!(check[0]["validates"], false);
    assert_eq!(check[0]["message"], NICKNAME_TAKEN);

    create(&mut state, &second, "bob");
    let created = second.drain_type("account:created");
    assert_eq!(created[0]["validates"], false);
    assert_eq!(created[0]["message"], NICKNAME_TAKEN);
    assert!(state.sessions().get("2").unwrap().nickname.is_none());
    assert!(rooms_of(&state, "2").is_empty());
}

#[test]
fn test_nickname_length_rules() {
    let mut state = state();
    let mut peer = connect(&mut state, "1");

    state.validate_check("1", Some(json!("nickname")), Some(json!("a")));
    state.validate_check("1", Some(json!("nickname")), Some(json!("x".repeat(25))));
    state.validate_check("1", Some(json!("nickname")), Some(json!("bob")));
    let checks = peer.drain_type("check:nickname");
    assert_eq!(checks[0]["message"], NICKNAME_TOO_SHORT);
    assert_eq!(checks[1]["message"], NICKNAME_TOO_LONG);
    assert_eq!(checks[2]["validates"], true);
    assert_eq!(checks[2]["nickname"], "bob");

    create(&mut state, &peer, "a");
    let created = peer.drain_type("account:created");
    assert_eq!(created[0]["validates"], false);
    assert_eq!(created[0]["message"], NICKNAME_TOO_SHORT);
}

#[test]
fn test_email_validation() {
    let mut state = state();
    let mut peer = connect(&mut state, "1");

    state.validate_check("1", Some(json!("email")), Some(json!("nope")));
    state.validate_check("1", Some(json!("email")), Some(json!("bob@example.com")));
    let checks = peer.drain_type("check:email");
    assert_eq!(checks[0]["validates"], false);
    assert_eq!(checks[0]["message"], EMAIL_INVALID);
    assert_eq!(checks[1]["validates"], true);
    assert!(checks[1]["gravatar"].as_str().unwrap().ends_with("?s=48&r=pg&d=404"));

    state
        .create_account("1", Some(json!("bob")), Some(json!("not-an-email")))
        .unwrap();
    state.create_account("1", Some(json!("bob")), None).unwrap();
    let created = peer.drain_type("account:created");
    assert_eq!(created[0]["message"], EMAIL_INVALID);
    assert_eq!(created[1]["message"], ACCOUNT_INCOMPLETE);
}

#[test]
fn test_nickname_is_immutable() {
    let mut state = state();
    let mut peer = connect(&mut state, "1");
    create(&mut state, &peer, "bob");
    peer.drain();

    create(&mut state, &peer, "robert");
    assert!(peer.drain().is_empty());
    assert_eq!(state.sessions().get("1").unwrap().nickname.as_deref(), Some("bob"));
}

#[test]
fn test_join_is_announced_to_roommates() {
    let mut state = state();
    let mut bob = connect(&mut state, "1");
    let mut alice = connect(&mut state, "2");
    create(&mut state, &bob, "bob");
    bob.drain();
    create(&mut state, &alice, "alice");

    let joins = bob.drain_type("user:join");
    assert_eq!(joins.len(), 1);
    assert_eq!(joins[0]["nickname"], "alice");
    assert_eq!(joins[0]["slug"], "alice");
    assert_eq!(joins[0]["rooms"], json!(rooms_of(&state, "1")));

    let created = alice.drain_type("account:created");
    assert_eq!(created[0]["roommates"][0]["nickname"], "bob");
    assert!(alice.drain_type("user:join").is_empty());
}

#[test]
fn test_comment_reaches_only_roommates() {
    let mut state = state();
    let mut peers: Vec<Peer> = (0..4).map(|i| connect(&mut state, &i.to_string())).collect();
    for (i, name) in ["ann", "ben", "cat", "dan"].iter().enumerate() {
        create(&mut state, &peers[i], name);
    }
    // ann, ben and cat fill the first room; dan opens a second
    assert_eq!(rooms_of(&state, "0"), rooms_of(&state, "2"));
    assert_ne!(rooms_of(&state, "0"), rooms_of(&state, "3"));
    for peer in peers.iter_mut() {
        peer.drain();
    }

    state.comment("0", "hello <b>there</b>".to_string()).unwrap();

    for i in [1, 2] {
        let comments = peers[i].drain_type("comment");
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0]["nickname"], "ann");
        assert_eq!(comments[0]["message"], "hello &lt;b&gt;there&lt;&#x2f;b&gt;");
        assert_eq!(comments[0]["rooms"], json!(rooms_of(&state, "0")));
        assert!(comments[0]["time"].is_string());
    }
    assert!(peers[0].drain().is_empty());
    assert!(peers[3].drain().is_empty());

    let details = &state.sessions().get("0").unwrap().details;
    assert_eq!((details.lines, details.words), (1, 2));
}

#[test]
fn test_short_or_roomless_comments_are_dropped() {
    let mut state = state();
    let mut a = connect(&mut state, "a");
    let mut b = connect(&mut state, "b");
    create(&mut state, &a, "ann");
    create(&mut state, &b, "ben");
    a.drain();
    b.drain();

    state.comment("a", "k".to_string()).unwrap();
    assert!(b.drain().is_empty());

    let mut anon = connect(&mut state, "anon");
    state.comment("anon", "anyone there?".to_string()).unwrap();
    assert!(a.drain().is_empty());
    assert!(b.drain().is_empty());
    assert!(anon.drain().is_empty());
}

#[test]
fn test_blacklisted_sender_gets_error() {
    let mut state = state();
    let mut anna = connect(&mut state, "a");
    let mut eve = connect(&mut state, "e");
    create(&mut state, &anna, "anna");
    create(&mut state, &eve, "eve");
    anna.drain();
    eve.drain();

    state.blacklist("a", "Eve").unwrap();
    let notice = anna.drain_type("notice");
    assert_eq!(notice[0]["message"], "Successfully blacklisted eve");

    state
        .private_message("e", Some("anna".to_string()), "hi anna".to_string())
        .unwrap();
    let errors = eve.drain();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["type"], "error");
    assert_eq!(errors[0]["message"], "Blacklisted");
    assert!(anna.drain().is_empty());

    // the block is one-way
    state
        .private_message("a", Some("eve".to_string()), "hello eve".to_string())
        .unwrap();
    let delivered = eve.drain_type("private");
    assert_eq!(delivered[0]["from"], "anna");
    assert_eq!(delivered[0]["message"], "hello eve");
    assert!(anna.drain().is_empty());
}

#[test]
fn test_private_message_edge_cases() {
    let mut state = state();
    let mut a = connect(&mut state, "a");
    let mut b = connect(&mut state, "b");
    create(&mut state, &a, "anna");
    create(&mut state, &b, "ben");
    a.drain();
    b.drain();

    state.private_message("a", None, "nobody".to_string()).unwrap();
    state.private_message("a", Some("anna".to_string()), "myself".to_string()).unwrap();
    state.private_message("a", Some("ghost".to_string()), "boo".to_string()).unwrap();
    assert!(a.drain().is_empty());
    assert!(b.drain().is_empty());

    state.private_message("a", Some(" BEN ".to_string()), "psst".to_string()).unwrap();
    assert_eq!(b.drain_type("private").len(), 1);
}

#[test]
fn test_disconnect_notifies_and_releases_room() {
    let mut state = state();
    let mut a = connect(&mut state, "a");
    let mut b = connect(&mut state, "b");
    create(&mut state, &a, "anna");
    create(&mut state, &b, "ben");
    let room = rooms_of(&state, "a")[0].clone();
    a.drain();

    state.disconnect("b").unwrap();
    let departs = a.drain_type("user:depart");
    assert_eq!(departs.len(), 1);
    assert_eq!(departs[0]["nickname"], "ben");
    assert_eq!(state.rooms().tier_of(&room), Some(Tier::One));
    assert_eq!(state.stats().users, 1);
    assert!(!state.sessions().is_nickname_taken("ben"));

    state.disconnect("a").unwrap();
    assert_eq!(state.rooms().tier_of(&room), None);
    assert_eq!(state.stats().rooms, 0);
    assert_eq!(state.stats().connections, 0);
}

#[test]
fn test_shuffle_regroups_named_clients() {
    let mut state = state();
    let mut peers: Vec<Peer> = (0..10).map(|i| connect(&mut state, &i.to_string())).collect();
    for i in 0..7 {
        create(&mut state, &peers[i], &format!("user{}", i));
    }
    for peer in peers.iter_mut() {
        peer.drain();
    }

    state.shuffle();

    let stats = state.stats();
    assert_eq!(stats.laps, 1);
    assert_eq!(stats.users, 7);
    assert_eq!(stats.rooms, 3);
    assert_eq!(state.rooms().tiers().occupant_count(), 7);

    let mut lonely = 0;
    for (i, peer) in peers.iter_mut().enumerate() {
        let client = state.sessions().get(&peer.id).unwrap();
        let announcements = peer.drain_type("announcement");
        if i < 7 {
            assert_eq!(client.rooms.len(), 1);
            assert_eq!(client.details.resync, 1);
            assert_eq!(announcements.len(), 1);
            assert_eq!(announcements[0]["reset"], true);
            assert_eq!(announcements[0]["message"], "Shuffling the rooms");
            assert_eq!(announcements[0]["rooms"], json!(client.rooms));
            if announcements[0].get("roommates").is_none() {
                lonely += 1;
            }
        } else {
            assert!(client.rooms.is_empty());
            assert_eq!(client.details.resync, 0);
            assert_eq!(announcements.len(), 1);
            assert_eq!(announcements[0]["reset"], true);
            assert_eq!(announcements[0]["rooms"], json!([]));
            assert!(announcements[0].get("roommates").is_none());
        }
    }
    // the first client placed in each room had nobody to meet yet
    assert_eq!(lonely, 3);
}

#[test]
fn test_shuffle_announces_newcomers_to_existing_occupants() {
    let mut state = state();
    let mut peers: Vec<Peer> = (0..3).map(|i| connect(&mut state, &i.to_string())).collect();
    for i in 0..3 {
        create(&mut state, &peers[i], &format!("user{}", i));
    }
    for peer in peers.iter_mut() {
        peer.drain();
    }

    state.reset();

    // three clients land in one room: two joins seen by the first, one by the second
    let mut joins: Vec<usize> = peers
        .iter_mut()
        .map(|p| p.drain_type("user:join").len())
        .collect();
    joins.sort();
    assert_eq!(joins, vec![0, 1, 2]);
    assert_eq!(state.stats().laps, 0);
}
