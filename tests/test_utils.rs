// advisable because not all test modules use all functions of this module:
#![allow(dead_code)]

use flexi_logger::{opt_format, Logger, LoggerHandle};
use hsmsconnect::{MessageManager, PortConfiguration, SecsPort, SecsResult};
use std::sync::Arc;
use std::time::Duration;

// Returns a logger that prints out all info, warn and error messages.
pub fn init_logger() -> LoggerHandle {
    Logger::try_with_env_or_str("info")
        .unwrap()
        .format(opt_format)
        .start()
        .unwrap_or_else(|e| panic!("Logger initialization failed with {e}"))
}

// Timers tightened so that a test run never sits on a default 45s timeout.
pub fn fast_config() -> PortConfiguration {
    PortConfiguration::default()
        .with_connect_time_limit(Duration::from_secs(2))
        .with_t3_reply_timeout(Duration::from_secs(10))
        .with_t6_control_transaction(Duration::from_secs(2))
        .with_t7_not_selected(Duration::from_secs(5))
        .with_idle_linktest_interval(Duration::from_secs(60))
}

// A selected equipment/host pair talking over the loopback interface.
pub struct LinkedPair {
    pub equipment: Arc<MessageManager>,
    pub host: Arc<MessageManager>,
    pub equipment_port: SecsPort,
    pub host_port: SecsPort,
}

impl LinkedPair {
    pub fn bring_up(
        equipment_config: PortConfiguration,
        host_config: PortConfiguration,
    ) -> SecsResult<LinkedPair> {
        let equipment = MessageManager::new();
        let equipment_port = equipment.create_port(
            "equipment",
            "hsms-passive://127.0.0.1:0?device_id=1",
            Some(equipment_config),
            true,
        )?;
        equipment_port.go_online()?;
        let addr = equipment_port.local_addr().expect("port is listening");

        let host = MessageManager::new();
        let host_port = host.create_port(
            "host",
            format!("hsms://127.0.0.1:{}?device_id=1", addr.port()),
            Some(host_config),
            true,
        )?;
        host_port.go_online()?;

        Ok(LinkedPair {
            equipment,
            host,
            equipment_port,
            host_port,
        })
    }

    pub fn tear_down(self) -> SecsResult<()> {
        self.host.stop_ports_if_needed(true)?;
        self.equipment.stop_ports_if_needed(true)?;
        Ok(())
    }
}
