// Addressing of a port: who to connect to (or where to listen), and the
// wire identity (device id / session id) used on that connection.

pub mod connect_params;
pub mod connect_params_builder;
mod cp_url;

pub use self::{
    connect_params::{ConnectParams, IntoConnectParams, PortMode},
    connect_params_builder::ConnectParamsBuilder,
};
