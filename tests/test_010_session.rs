mod test_utils;

use flexi_logger::LoggerHandle;
use hsmsconnect::{PortConnectionState, SecsError, SecsResult, SendRejectReason};
use log::*;
use std::time::{Duration, Instant};
use test_utils::LinkedPair;

#[test]
fn test_010_session() -> SecsResult<()> {
    let mut log_handle = test_utils::init_logger();
    let start = Instant::now();
    select_handshake(&mut log_handle).unwrap();
    idle_linktest_keeps_the_session_alive(&mut log_handle).unwrap();
    offline_rejects_sends(&mut log_handle).unwrap();
    info!("Elapsed time: {:?}", Instant::now().duration_since(start));
    Ok(())
}

fn select_handshake(_log_handle: &mut LoggerHandle) -> SecsResult<()> {
    info!("test that an active port reaches Selected against a passive one");
    let pair = LinkedPair::bring_up(test_utils::fast_config(), test_utils::fast_config())?;

    assert_eq!(
        pair.host_port.connection_state(),
        PortConnectionState::Selected
    );
    assert_eq!(
        pair.equipment_port.connection_state(),
        PortConnectionState::Selected
    );
    assert_eq!(pair.host_port.port_num(), 1);

    pair.tear_down()?;
    Ok(())
}

fn idle_linktest_keeps_the_session_alive(_log_handle: &mut LoggerHandle) -> SecsResult<()> {
    info!("test that an idle line is probed with linktests and stays selected");
    let host_config = test_utils::fast_config()
        .with_idle_linktest_interval(Duration::from_millis(150))
        .with_t6_control_transaction(Duration::from_millis(800));
    let pair = LinkedPair::bring_up(test_utils::fast_config(), host_config)?;

    // several linktest intervals of complete silence; a missing or
    // unanswered linktest would fail the connection within T6
    std::thread::sleep(Duration::from_millis(900));
    assert_eq!(
        pair.host_port.connection_state(),
        PortConnectionState::Selected
    );
    assert_eq!(
        pair.equipment_port.connection_state(),
        PortConnectionState::Selected
    );

    pair.tear_down()?;
    Ok(())
}

fn offline_rejects_sends(_log_handle: &mut LoggerHandle) -> SecsResult<()> {
    info!("test that a port taken offline rejects further sends");
    let pair = LinkedPair::bring_up(test_utils::fast_config(), test_utils::fast_config())?;

    pair.host_port.go_offline(true)?;
    assert_eq!(
        pair.host_port.connection_state(),
        PortConnectionState::OutOfService
    );

    let message = hsmsconnect::DataMessage::builder()
        .stream(1)
        .function(13)
        .wants_reply(true)
        .build()?;
    match pair.host_port.send(message) {
        Err(SecsError::SendRejected(SendRejectReason::NotConnected)) => {}
        other => panic!("expected a NotConnected rejection, got {other:?}"),
    }

    pair.equipment.stop_ports_if_needed(false)?;
    Ok(())
}
