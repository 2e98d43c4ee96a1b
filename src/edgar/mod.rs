//! SEC EDGAR access: filing search, document download, company lookup

mod client;
mod types;

pub use client::EdgarClient;
pub use types::{CompanyInfo, FilingRef};
