//! Integration tests for adapters_transport crate
//!
//! These tests drive the full handle-based surface end to end: TCP
//! byte-stream fidelity across mismatched chunk boundaries, UDP datagram
//! mirroring between threads, the timeout-bounded accept, and handle
//! invalidation after destroy.

use adapters_transport::{
    local_addresses, supports_ipv4, Address, AddressFamily, NetworkConfig, NetworkContext,
    NetworkEventKind, SocketError, SocketState,
};
use std::io::{Read, Write};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn context() -> Arc<NetworkContext> {
    Arc::new(NetworkContext::new(NetworkConfig::default()))
}

fn loopback() -> Address {
    Address::loopback(AddressFamily::Ipv4)
}

fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect()
}

#[test]
fn test_state_machine_around_bind_listen_connect() {
    let context = context();
    let listener = context.tcp_allocate().unwrap();
    assert_eq!(context.state(listener).unwrap(), SocketState::NotConnected);

    context.bind(listener, &loopback()).unwrap();
    assert_eq!(context.state(listener).unwrap(), SocketState::NotConnected);

    context.tcp_listen(listener).unwrap();
    assert_eq!(context.state(listener).unwrap(), SocketState::Listening);

    // A failed connect leaves the client state unchanged
    let client = context.tcp_allocate().unwrap();
    let mut nowhere = loopback();
    nowhere.set_port(1);
    let _ = context.connect(client, &nowhere, 500);
    assert_eq!(context.state(client).unwrap(), SocketState::NotConnected);

    // A successful connect transitions strictly to Connected
    let target = context.local_address(listener).unwrap().unwrap();
    context.connect(client, &target, 5000).unwrap();
    assert_eq!(context.state(client).unwrap(), SocketState::Connected);
}

#[test]
fn test_tcp_stream_chunked_byte_fidelity() {
    // 127 + 180 + 10 bytes written on each side, read back as 235 + 82,
    // exercising chunk boundaries that match neither the writes nor the
    // datagram layout underneath
    let context = context();
    let listener = context.tcp_allocate().unwrap();
    context.bind(listener, &loopback()).unwrap();
    context.tcp_listen(listener).unwrap();
    let target = context.local_address(listener).unwrap().unwrap();

    let connector_context = Arc::clone(&context);
    let connector = thread::spawn(move || {
        let client = connector_context.tcp_allocate().unwrap();
        connector_context.connect(client, &target, 5000).unwrap();
        client
    });
    let accepted = context.tcp_accept(listener, 5000).unwrap();
    let client = connector.join().unwrap();

    let io_pass = |context: Arc<NetworkContext>, handle, out: Vec<u8>| {
        thread::spawn(move || {
            let mut stream = context.stream(handle, false).unwrap();

            stream.write_all(&out[..127]).unwrap();
            stream.write_all(&out[127..307]).unwrap();
            stream.flush().unwrap();
            stream.write_all(&out[307..]).unwrap();
            stream.flush().unwrap();

            let mut incoming = vec![0u8; 317];
            assert_eq!(stream.read(&mut incoming[..235]).unwrap(), 235);
            assert_eq!(stream.read(&mut incoming[235..]).unwrap(), 82);
            incoming
        })
    };

    let client_out = pattern(317, 3);
    let server_out = pattern(317, 101);
    let client_io = io_pass(Arc::clone(&context), client, client_out.clone());
    let server_io = io_pass(Arc::clone(&context), accepted, server_out.clone());

    let client_in = client_io.join().unwrap();
    let server_in = server_io.join().unwrap();

    // Exactly the peer's bytes, in order, regardless of chunking
    assert_eq!(client_in, server_out);
    assert_eq!(server_in, client_out);
}

#[test]
fn test_udp_datagram_mirror() {
    // Two UDP sockets on ephemeral localhost ports; a 973-byte datagram
    // is mirrored back to the reported sender address
    let context = context();
    let server = context.udp_create().unwrap();
    let client = context.udp_create().unwrap();
    context.bind(server, &loopback()).unwrap();
    context.bind(client, &loopback()).unwrap();

    let server_address = context.local_address(server).unwrap().unwrap();
    let client_address = context.local_address(client).unwrap().unwrap();

    let mirror_context = Arc::clone(&context);
    let mirror = thread::spawn(move || {
        let mut buf = vec![0u8; 1024];
        let (size, from) = mirror_context.udp_recv_from(server, &mut buf).unwrap();
        assert_eq!(size, 973);
        let sent = mirror_context.udp_send_to(server, &buf[..size], &from).unwrap();
        assert_eq!(sent, size);
        from
    });

    let payload = pattern(973, 7);
    assert_eq!(
        context.udp_send_to(client, &payload, &server_address).unwrap(),
        973
    );

    let mut buf = vec![0u8; 1024];
    let (size, from) = context.udp_recv_from(client, &mut buf).unwrap();
    assert_eq!(size, 973);
    assert_eq!(&buf[..size], &payload[..]);
    assert_eq!(from, server_address);

    // The mirror saw the client's bound endpoint as the sender
    let reported_sender = mirror.join().unwrap();
    assert_eq!(reported_sender, client_address);
}

#[test]
fn test_accept_timeout_elapses_and_restores_blocking() {
    let context = context();
    let listener = context.tcp_allocate().unwrap();
    context.bind(listener, &loopback()).unwrap();
    context.tcp_listen(listener).unwrap();

    let blocking_before = context.is_blocking(listener).unwrap();
    let start = Instant::now();
    let result = context.tcp_accept(listener, 400);
    let elapsed = start.elapsed();

    assert_eq!(result.unwrap_err(), SocketError::Timeout);
    assert!(elapsed >= Duration::from_millis(350));
    assert!(elapsed < Duration::from_secs(4));
    assert_eq!(context.is_blocking(listener).unwrap(), blocking_before);
}

#[test]
fn test_destroy_invalidates_handles() {
    let context = context();
    let server = context.udp_create().unwrap();
    let client = context.udp_create().unwrap();
    assert!(context.is_socket(server));
    assert!(context.is_socket(client));

    context.destroy(server);
    context.destroy(client);
    assert!(!context.is_socket(server));
    assert!(!context.is_socket(client));

    // Operations on destroyed handles fail without touching other state
    assert_eq!(
        context.state(server).unwrap_err(),
        SocketError::InvalidHandle
    );
    assert_eq!(
        context.bind(server, &loopback()).unwrap_err(),
        SocketError::InvalidHandle
    );
    context.destroy(server);

    // A fresh socket reusing the slot is not confused with the old handle
    let fresh = context.udp_create().unwrap();
    assert!(context.is_socket(fresh));
    assert!(!context.is_socket(server));
}

#[test]
fn test_lifecycle_events_drain_in_order() {
    let context = context();
    let listener = context.tcp_allocate().unwrap();
    context.bind(listener, &loopback()).unwrap();
    context.tcp_listen(listener).unwrap();
    let target = context.local_address(listener).unwrap().unwrap();

    let connector_context = Arc::clone(&context);
    let connector = thread::spawn(move || {
        let client = connector_context.tcp_allocate().unwrap();
        connector_context.connect(client, &target, 5000).unwrap();
        client
    });
    let accepted = context.tcp_accept(listener, 5000).unwrap();
    let client = connector.join().unwrap();

    context.destroy(accepted);
    context.destroy(client);

    let events = context.events().drain();
    let kinds: Vec<NetworkEventKind> = events.iter().map(|e| e.kind()).collect();
    assert!(kinds.contains(&NetworkEventKind::Connected));
    assert!(kinds.contains(&NetworkEventKind::Accepted));
    assert!(kinds.contains(&NetworkEventKind::Disconnected));

    // Drained events about destroyed sockets only carry the handle value
    for event in &events {
        if event.socket() == accepted {
            assert!(!context.is_socket(event.socket()));
        }
    }
}

#[test]
fn test_local_address_enumeration_is_owned() {
    if !supports_ipv4() {
        return;
    }
    let addresses = local_addresses().unwrap();
    assert!(!addresses.is_empty());

    let v4 = addresses
        .iter()
        .find(|a| a.family() == AddressFamily::Ipv4)
        .expect("host with IPv4 support lists an IPv4 address");

    // Enumerated entries are clones the caller may mutate freely
    let mut bind_target = v4.clone();
    bind_target.set_port(4040);
    assert_eq!(v4.port(), 0);
}

#[test]
fn test_udp_connected_pair_with_stop_flag_worker() {
    use std::sync::atomic::{AtomicBool, Ordering};

    // Cooperative shutdown: the worker checks a shared stop flag between
    // blocking calls and the socket is destroyed only after it returns
    let context = context();
    let worker_sock = context.udp_create().unwrap();
    let driver_sock = context.udp_create().unwrap();
    context.bind(worker_sock, &loopback()).unwrap();
    context.bind(driver_sock, &loopback()).unwrap();
    let worker_address = context.local_address(worker_sock).unwrap().unwrap();

    let stop = Arc::new(AtomicBool::new(false));
    let worker_context = Arc::clone(&context);
    let worker_stop = Arc::clone(&stop);
    let worker = thread::spawn(move || {
        let mut buf = [0u8; 64];
        let mut mirrored = 0;
        while !worker_stop.load(Ordering::Acquire) {
            let (size, from) = worker_context.udp_recv_from(worker_sock, &mut buf).unwrap();
            if &buf[..size] == b"stop" {
                break;
            }
            worker_context.udp_send_to(worker_sock, &buf[..size], &from).unwrap();
            mirrored += 1;
        }
        mirrored
    });

    for _ in 0..4 {
        context.udp_send_to(driver_sock, b"echo", &worker_address).unwrap();
        let mut buf = [0u8; 64];
        let (size, from) = context.udp_recv_from(driver_sock, &mut buf).unwrap();
        assert_eq!(&buf[..size], b"echo");
        assert_eq!(from, worker_address);
    }

    stop.store(true, Ordering::Release);
    context.udp_send_to(driver_sock, b"stop", &worker_address).unwrap();
    let mirrored = worker.join().unwrap();
    assert_eq!(mirrored, 4);

    // Destroy only after the worker observed the stop signal and returned
    context.destroy(worker_sock);
    context.destroy(driver_sock);
    assert!(!context.is_socket(worker_sock));
}
