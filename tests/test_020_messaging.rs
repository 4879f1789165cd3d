mod test_utils;

use flexi_logger::LoggerHandle;
use hsmsconnect::{DataMessage, SecsResult, SecsValue, StreamFunction};
use log::*;
use std::time::{Duration, Instant};
use test_utils::LinkedPair;

#[test]
fn test_020_messaging() -> SecsResult<()> {
    let mut log_handle = test_utils::init_logger();
    let start = Instant::now();
    establish_communications(&mut log_handle).unwrap();
    request_online(&mut log_handle).unwrap();
    host_command(&mut log_handle).unwrap();
    deferred_reply(&mut log_handle).unwrap();
    unhandled_primary_is_aborted(&mut log_handle).unwrap();
    info!("Elapsed time: {:?}", Instant::now().duration_since(start));
    Ok(())
}

// S1F13 -> S1F14 with an inline handler reply
fn establish_communications(_log_handle: &mut LoggerHandle) -> SecsResult<()> {
    info!("test S1F13 establish communications");
    let pair = LinkedPair::bring_up(test_utils::fast_config(), test_utils::fast_config())?;

    pair.equipment
        .register_handler(StreamFunction::new(1, 13, true), |message| {
            assert_eq!(message.value().unwrap(), SecsValue::List(vec![]));
            Some(SecsValue::List(vec![
                SecsValue::U1(0),
                SecsValue::List(vec![]),
            ]))
        })?;

    let reply = pair.host_port.transact(DataMessage::data(
        StreamFunction::new(1, 13, true),
        &SecsValue::List(vec![]),
    )?)?;

    assert_eq!(reply.sf(), StreamFunction::new(1, 14, false));
    assert_eq!(
        reply.value()?,
        SecsValue::List(vec![SecsValue::U1(0), SecsValue::List(vec![])])
    );

    pair.tear_down()
}

// S1F17 with an empty body -> S1F18 carrying B 0x00, within T3
fn request_online(_log_handle: &mut LoggerHandle) -> SecsResult<()> {
    info!("test S1F17 request online");
    let pair = LinkedPair::bring_up(test_utils::fast_config(), test_utils::fast_config())?;

    pair.equipment
        .register_handler(StreamFunction::new(1, 17, true), |message| {
            assert!(message.body().is_empty());
            Some(SecsValue::Binary(vec![0x00]))
        })?;

    let start = Instant::now();
    let reply = pair
        .host_port
        .transact(DataMessage::builder().stream(1).function(17).wants_reply(true).build()?)?;
    assert!(Instant::now().duration_since(start) < Duration::from_secs(10));
    assert_eq!(reply.sf(), StreamFunction::new(1, 18, false));
    assert_eq!(reply.value()?, SecsValue::Binary(vec![0x00]));

    pair.tear_down()
}

// S2F41 host command START -> S2F42 acknowledge
fn host_command(_log_handle: &mut LoggerHandle) -> SecsResult<()> {
    info!("test S2F41 host command");
    let pair = LinkedPair::bring_up(test_utils::fast_config(), test_utils::fast_config())?;

    pair.equipment
        .register_handler(StreamFunction::new(2, 41, true), |message| {
            let value = message.value().unwrap();
            let elements = value.as_list().unwrap();
            assert_eq!(elements[0].as_str(), Some("START"));
            Some(SecsValue::List(vec![
                SecsValue::U1(0),
                SecsValue::List(vec![]),
            ]))
        })?;

    let reply = pair.host_port.transact(DataMessage::data(
        StreamFunction::new(2, 41, true),
        &SecsValue::List(vec![
            SecsValue::ascii("START"),
            SecsValue::List(vec![]),
        ]),
    )?)?;
    assert_eq!(reply.sf(), StreamFunction::new(2, 42, false));
    assert_eq!(
        reply.value()?.as_list().unwrap()[0],
        SecsValue::U1(0)
    );

    pair.tear_down()
}

// the S6F11 handler returns no inline reply; an application task sends the
// S6F12 later, and the initiator's transact completes with it
fn deferred_reply(_log_handle: &mut LoggerHandle) -> SecsResult<()> {
    info!("test deferred S6F12 reply");
    let pair = LinkedPair::bring_up(test_utils::fast_config(), test_utils::fast_config())?;

    let replier = pair.equipment_port.clone();
    pair.equipment
        .register_handler(StreamFunction::new(6, 11, true), move |message| {
            let replier = replier.clone();
            let primary = message.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(100));
                replier
                    .send_reply(&primary, &SecsValue::U1(0))
                    .expect("deferred reply");
            });
            None
        })?;

    let reply = pair.host_port.transact(DataMessage::data(
        StreamFunction::new(6, 11, true),
        &SecsValue::List(vec![]),
    )?)?;
    assert_eq!(reply.sf(), StreamFunction::new(6, 12, false));
    assert_eq!(reply.value()?, SecsValue::U1(0));

    pair.tear_down()
}

// a reply-expecting primary without any handler earns the S3F0 abort
fn unhandled_primary_is_aborted(_log_handle: &mut LoggerHandle) -> SecsResult<()> {
    info!("test transaction abort for an unhandled primary");
    let pair = LinkedPair::bring_up(test_utils::fast_config(), test_utils::fast_config())?;

    let reply = pair.host_port.transact(DataMessage::data(
        StreamFunction::new(3, 17, true),
        &SecsValue::U1(1),
    )?)?;
    assert!(reply.is_abort());
    assert_eq!(reply.sf(), StreamFunction::new(3, 0, false));
    assert!(reply.body().is_empty());

    pair.tear_down()
}
