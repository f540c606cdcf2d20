//! Client Tests
//!
//! End-to-end tests against a threaded fake server over TCP.

#[path = "../common/mod.rs"]
mod common;

use std::collections::HashMap;

use common::FakeServer;
use redwire::{Client, Commands, Config, ConnectionState, RedwireError, Reply, Request};

fn client(server: &FakeServer) -> Client {
    Client::open(&server.config()).unwrap()
}

// =============================================================================
// Direct Call Tests
// =============================================================================

#[test]
fn test_hset_then_hget() {
    let server = FakeServer::start();
    let mut client = client(&server);

    assert_eq!(client.hset("hashkey", "field", "human").unwrap(), 1);
    assert_eq!(
        client.hget("hashkey", "field").unwrap().as_deref(),
        Some("human")
    );
    assert_eq!(client.hset("hashkey", "field", "robot").unwrap(), 0);
}

#[test]
fn test_hgetall_binds_mapping() {
    let server = FakeServer::start();
    let mut client = client(&server);

    client.hset("hero", "name", "superman").unwrap();
    client.hset("hero", "address", "north pole").unwrap();

    let mut expected = HashMap::new();
    expected.insert("name".to_string(), "superman".to_string());
    expected.insert("address".to_string(), "north pole".to_string());
    assert_eq!(client.hgetall("hero").unwrap(), Some(expected));
}

#[test]
fn test_missing_key_is_none() {
    let server = FakeServer::start();
    let mut client = client(&server);

    assert_eq!(client.get("nokey").unwrap(), None);
    assert_eq!(
        client.mget(&["nokey", "other"]).unwrap(),
        Some(vec![None, None])
    );
}

#[test]
fn test_server_error_surfaces() {
    let server = FakeServer::start();
    let mut client = client(&server);

    client.set("text", "abc").unwrap();
    let err = client.incr("text").unwrap_err();
    assert!(matches!(err, RedwireError::Server(ref msg) if msg.starts_with("ERR")));

    // Still usable afterwards
    assert_eq!(client.incr("counter").unwrap(), 1);
}

#[test]
fn test_execute_raw_request() {
    let server = FakeServer::start();
    let mut client = client(&server);

    let reply: Reply = client.execute(Request::command("PING")).unwrap();
    assert_eq!(reply, Reply::status("PONG"));

    let reply = client.send_one(&Request::command("NOSUCH")).unwrap();
    assert!(reply.is_error());
}

#[test]
fn test_database_selected_on_connect() {
    let server = FakeServer::start();

    let mut db2 = Client::connect(&server.url(2)).unwrap();
    db2.set("k", "in db 2").unwrap();

    let mut db0 = client(&server);
    assert_eq!(db0.get("k").unwrap(), None);
    assert_eq!(db2.get("k").unwrap().as_deref(), Some("in db 2"));

    assert_eq!(server.commands()[0], vec!["SELECT".to_string(), "2".to_string()]);
}

#[test]
fn test_close_then_call() {
    let server = FakeServer::start();
    let mut client = client(&server);

    client.close();
    assert_eq!(client.connection().state(), ConnectionState::Closed);
    assert!(matches!(client.ping(), Err(RedwireError::ConnectionClosed)));
}

#[test]
fn test_connect_refused() {
    // Bind then drop to get a port with nothing listening
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = Config::builder()
        .port(port)
        .connect_timeout_ms(1_000)
        .build();

    assert!(matches!(Client::open(&config), Err(RedwireError::Io(_))));
}

// =============================================================================
// Pipeline Tests
// =============================================================================

#[test]
fn test_pipeline_set_get() {
    let server = FakeServer::start();
    let mut client = client(&server);

    let mut pipe = client.pipeline();
    let set1 = pipe.set("key1", "human");
    let set2 = pipe.set("key2", "human");
    let get1 = pipe.get("key1");
    let get3 = pipe.get("key3");

    assert!(!set1.is_set());
    assert!(!get3.is_set());

    assert!(pipe.commit().unwrap());

    assert_eq!(set1.value(), Some(Some("OK".to_string())));
    assert_eq!(set2.value(), Some(Some("OK".to_string())));
    assert_eq!(get1.value(), Some(Some("human".to_string())));
    assert_eq!(get3.value(), Some(None));
}

#[test]
fn test_pipeline_then_direct_call() {
    let server = FakeServer::start();
    let mut client = client(&server);

    {
        let mut pipe = client.pipeline();
        for _ in 0..10 {
            let _ = pipe.incr("counter");
        }
        pipe.commit().unwrap();
    }

    assert_eq!(client.get("counter").unwrap().as_deref(), Some("10"));
}

// =============================================================================
// Transaction Tests
// =============================================================================

#[test]
fn test_transaction_commits() {
    let server = FakeServer::start();
    let mut client = client(&server);

    let mut tx = client.transaction();
    let set = tx.set("key1", "human");
    let incr = tx.incr("counter");
    let get = tx.get("key1");
    assert!(tx.commit().unwrap());

    assert_eq!(set.value(), Some(Some("OK".to_string())));
    assert_eq!(incr.value(), Some(1));
    assert_eq!(get.value(), Some(Some("human".to_string())));

    let names: Vec<String> = server
        .commands()
        .into_iter()
        .map(|command| command[0].clone())
        .collect();
    assert_eq!(names, vec!["SELECT", "MULTI", "SET", "INCR", "GET", "EXEC"]);
}

#[test]
fn test_watched_key_change_aborts_transaction() {
    let server = FakeServer::start();
    let mut client = client(&server);

    client.set("balance", "100").unwrap();
    client.watch(&["balance"]).unwrap();

    server.set_external(0, "balance", "50");

    let mut tx = client.transaction();
    let set = tx.set("balance", "200");
    assert!(!tx.commit().unwrap());
    assert!(!set.is_set());

    assert_eq!(client.get("balance").unwrap().as_deref(), Some("50"));
}

#[test]
fn test_unwatched_transaction_succeeds() {
    let server = FakeServer::start();
    let mut client = client(&server);

    client.watch(&["balance"]).unwrap();
    client.unwatch().unwrap();
    server.set_external(0, "balance", "50");

    let mut tx = client.transaction();
    let set = tx.set("balance", "200");
    assert!(tx.commit().unwrap());
    assert_eq!(set.value(), Some(Some("OK".to_string())));
}

#[test]
fn test_transaction_with_unknown_command() {
    let server = FakeServer::start();
    let mut client = client(&server);

    let mut tx = client.transaction();
    let set = tx.set("k", "v");
    let _bogus = tx.enqueue::<redwire::Text>(Request::command("BOGUS"));

    let err = tx.commit().unwrap_err();
    assert!(matches!(err, RedwireError::Server(ref msg) if msg.contains("unknown command")));
    assert!(!set.is_set());

    // Nothing applied, connection still aligned
    assert_eq!(client.get("k").unwrap(), None);
}
