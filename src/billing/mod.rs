/*!
 * Billing Module
 *
 * Detail records and the recorder interface that persists them.
 */

pub mod record;
pub mod recorder;

pub use record::DetailRecord;
pub use recorder::{DetailRecorder, InMemoryDetailRecorder};
