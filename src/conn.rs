// The session side: per-port engine, its TCP plumbing, the state machine,
// and the parameters/configuration that shape one port.

mod params;
mod pending;
mod port;
mod port_configuration;
mod session_core;
mod session_state;
mod tcp_client;

pub use {
    params::{
        connect_params::{ConnectParams, IntoConnectParams, PortMode},
        connect_params_builder::ConnectParamsBuilder,
    },
    port::{PendingReply, SecsPort},
    port_configuration::PortConfiguration,
    session_state::PortConnectionState,
};
