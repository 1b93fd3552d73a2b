use crate::gate::GateConfig;

pub mod server;

#[derive(Debug)]
pub enum Action {
    Server { port: u16, config: GateConfig },
}
