mod test_utils;

use flexi_logger::LoggerHandle;
use hsmsconnect::{
    DataMessage, MessageManager, PortConnectionState, SecsError, SecsResult, SecsValue,
    StreamFunction,
};
use log::*;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::time::{Duration, Instant};
use test_utils::LinkedPair;

#[test]
fn test_030_faults() -> SecsResult<()> {
    let mut log_handle = test_utils::init_logger();
    let start = Instant::now();
    reply_timeout(&mut log_handle).unwrap();
    bad_frame_length_closes_the_connection(&mut log_handle).unwrap();
    select_timeout_against_a_mute_peer(&mut log_handle).unwrap();
    connect_refused(&mut log_handle).unwrap();
    unselected_connection_expires(&mut log_handle).unwrap();
    disconnect_cancels_pending_sends(&mut log_handle).unwrap();
    info!("Elapsed time: {:?}", Instant::now().duration_since(start));
    Ok(())
}

// a primary whose peer never replies completes with the T3 reply timeout
fn reply_timeout(_log_handle: &mut LoggerHandle) -> SecsResult<()> {
    info!("test T3 reply timeout");
    let host_config = test_utils::fast_config().with_t3_reply_timeout(Duration::from_millis(500));
    let pair = LinkedPair::bring_up(test_utils::fast_config(), host_config)?;

    // a handler that never replies, inline or deferred
    pair.equipment
        .register_handler(StreamFunction::new(5, 1, true), |_| None)?;

    let start = Instant::now();
    let outcome = pair
        .host_port
        .send(DataMessage::data(
            StreamFunction::new(5, 1, true),
            &SecsValue::Empty,
        )?)?
        .wait();
    let elapsed = Instant::now().duration_since(start);

    assert!(matches!(outcome, Err(SecsError::ReplyTimeout)));
    assert!(
        elapsed >= Duration::from_millis(300) && elapsed <= Duration::from_secs(3),
        "T3 fired after {elapsed:?}"
    );
    // the session survives a per-transaction timeout
    assert_eq!(
        pair.host_port.connection_state(),
        PortConnectionState::Selected
    );

    pair.tear_down()
}

// a declared frame length below 10 is a protocol violation; the receiver
// drops the connection
fn bad_frame_length_closes_the_connection(_log_handle: &mut LoggerHandle) -> SecsResult<()> {
    info!("test protocol violation on an undersized frame length");
    let equipment = MessageManager::new();
    let port = equipment.create_port(
        "equipment",
        "hsms-passive://127.0.0.1:0?device_id=1",
        Some(test_utils::fast_config()),
        false,
    )?;
    port.go_online()?;
    let addr = port.local_addr().expect("port is listening");

    let mut raw = TcpStream::connect(addr)?;
    raw.write_all(&[0, 0, 0, 5, 0xAA, 0xBB])?;
    raw.set_read_timeout(Some(Duration::from_secs(5)))?;
    let mut sink = [0_u8; 16];
    // the peer closes; read drains to EOF (or errors on the reset)
    let closed = matches!(raw.read(&mut sink), Ok(0) | Err(_));
    assert!(closed, "expected the receiver to close the connection");

    equipment.stop_ports_if_needed(false)
}

// active side gives up selecting when the peer accepts but stays mute
fn select_timeout_against_a_mute_peer(_log_handle: &mut LoggerHandle) -> SecsResult<()> {
    info!("test T6 select timeout");
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    let mute = std::thread::spawn(move || {
        // accept and hold the socket open without ever answering
        let accepted = listener.accept();
        std::thread::sleep(Duration::from_secs(4));
        drop(accepted);
    });

    let host = MessageManager::new();
    let port = host.create_port(
        "host",
        format!("hsms://127.0.0.1:{}?device_id=1", addr.port()),
        Some(
            test_utils::fast_config().with_t6_control_transaction(Duration::from_millis(500)),
        ),
        false,
    )?;
    let start = Instant::now();
    let outcome = port.go_online();
    let elapsed = Instant::now().duration_since(start);

    assert!(matches!(outcome, Err(SecsError::SelectTimeout)));
    assert!(elapsed < Duration::from_secs(4), "gave up after {elapsed:?}");

    host.stop_ports_if_needed(false)?;
    mute.join().ok();
    Ok(())
}

fn connect_refused(_log_handle: &mut LoggerHandle) -> SecsResult<()> {
    info!("test connect against a closed port");
    // bind-then-drop yields a port nobody listens on
    let addr = TcpListener::bind("127.0.0.1:0")?.local_addr()?;

    let host = MessageManager::new();
    let port = host.create_port(
        "host",
        format!("hsms://127.0.0.1:{}?device_id=1", addr.port()),
        Some(test_utils::fast_config()),
        false,
    )?;
    match port.go_online() {
        Err(SecsError::ConnectFailed { .. } | SecsError::ConnectTimeout) => {}
        other => panic!("expected a connect failure, got {other:?}"),
    }
    host.stop_ports_if_needed(false)
}

// a connection that is never selected expires after T7
fn unselected_connection_expires(_log_handle: &mut LoggerHandle) -> SecsResult<()> {
    info!("test T7 not-selected timeout");
    let equipment = MessageManager::new();
    let port = equipment.create_port(
        "equipment",
        "hsms-passive://127.0.0.1:0?device_id=1",
        Some(test_utils::fast_config().with_t7_not_selected(Duration::from_millis(300))),
        false,
    )?;
    port.go_online()?;
    let addr = port.local_addr().expect("port is listening");

    let mut raw = TcpStream::connect(addr)?;
    raw.set_read_timeout(Some(Duration::from_secs(5)))?;
    let mut sink = [0_u8; 16];
    let closed = matches!(raw.read(&mut sink), Ok(0) | Err(_));
    assert!(closed, "expected T7 to close the unselected connection");

    equipment.stop_ports_if_needed(false)
}

// a forced disconnect mid-transaction cancels every pending send
fn disconnect_cancels_pending_sends(_log_handle: &mut LoggerHandle) -> SecsResult<()> {
    info!("test cancel of pending sends on disconnect");
    let pair = LinkedPair::bring_up(test_utils::fast_config(), test_utils::fast_config())?;

    // swallow the primaries without replying
    pair.equipment
        .register_handler(StreamFunction::new(5, 1, true), |_| None)?;

    let pending: Vec<_> = (0..3)
        .map(|_| {
            pair.host_port
                .send(
                    DataMessage::data(StreamFunction::new(5, 1, true), &SecsValue::Empty)
                        .expect("build"),
                )
                .expect("send admission")
        })
        .collect();

    // give the writes a moment to reach the wire, then pull the plug
    std::thread::sleep(Duration::from_millis(200));
    pair.equipment_port.go_offline(false)?;

    for handle in pending {
        match handle.wait_timeout(Duration::from_secs(5)) {
            Err(SecsError::Canceled) => {}
            other => panic!("expected Canceled, got {other:?}"),
        }
    }

    pair.host.stop_ports_if_needed(false)
}
