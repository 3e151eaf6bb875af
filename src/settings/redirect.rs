use clap::Parser;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

#[derive(Parser, Debug, Serialize, Deserialize, Clone)]
pub struct RedirectOptions {
    /// Source address treated as local; its traffic is passed through
    #[arg(long = "local-addr", id = "local-addr", default_value = "192.168.199.189")]
    #[serde(default = "default_local_addr")]
    pub local_addr: Ipv4Addr,

    /// Address the destination field is rewritten to
    #[arg(long = "redirect-to", id = "redirect-to", default_value = "192.168.199.189")]
    #[serde(default = "default_redirect_to")]
    pub redirect_to: Ipv4Addr,

    /// Connection-tracking mark attached to every verdict
    #[arg(long = "mark", id = "mark", default_value_t = 42)]
    #[serde(default = "default_mark")]
    pub mark: u32,
}

impl Default for RedirectOptions {
    fn default() -> Self {
        RedirectOptions {
            local_addr: default_local_addr(),
            redirect_to: default_redirect_to(),
            mark: default_mark(),
        }
    }
}

fn default_local_addr() -> Ipv4Addr {
    Ipv4Addr::new(192, 168, 199, 189)
}

fn default_redirect_to() -> Ipv4Addr {
    Ipv4Addr::new(192, 168, 199, 189)
}

fn default_mark() -> u32 {
    42
}
