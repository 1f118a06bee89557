//! Download plumbing shared by every sub-cycle.
//!
//! [`Transport`] is the seam to the network ([`HttpTransport`] by default), and
//! [`SlotManager`] keeps at most one live fetch per [`SlotKind`].

mod slots;
mod transport;

pub use slots::{Download, SlotKind, SlotManager};
pub use transport::{FetchResponse, HttpTransport, Transport};
