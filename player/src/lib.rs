//! Live and recorded frame sources for the tableau client.
//!
//! Both sources feed the same [`scene::StateStore`]: a network read loop over
//! a [`Transport`], and a [`MoviePlayer`] ticking through a recording with
//! checkpointed seeking. Decoding happens on whichever thread calls in,
//! serialized by the store's lock.
//!
//! # Design Principles
//!
//! - **Cooperative cancellation** - Loops check a shared [`Cancel`] between reads
//!   and frames; an in-flight seek runs to completion.
//! - **Timeouts are not errors** - Read deadlines only bound how long cancellation
//!   can go unnoticed.

mod cancel;
mod config;
mod movie;
mod read_loop;
mod transport;

pub use cancel::Cancel;
pub use config::{PlayerConfig, DRAW_STATE_TAG};
pub use movie::MoviePlayer;
pub use read_loop::{run_read_loop, ReadLoopStats};
pub use transport::{
    encode_frame, MemoryTransport, Message, StreamTransport, TcpTransport, Transport,
    FRAME_HEADER_LEN,
};
