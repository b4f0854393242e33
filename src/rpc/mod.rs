//! The JSON-RPC-over-stdio layer: request parsing/routing (`kernel`) and
//! the line-delimited transport that carries it (`transport`).

pub mod kernel;
pub mod transport;
