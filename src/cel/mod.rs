//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Channel event logging (CEL) data model and its canonical JSON form.
//
// | Component          | Description                                               |
// |--------------------|-----------------------------------------------------------|
// | EventRecord        | One event as handed in by the event source                |
// | CanonicalMessage   | The JSON document published for a record                  |
// | transform          | Pure record -> document mapping, with the `extra` fallback |
//--------------------------------------------------------------------------------------------------

mod record;
mod transform;

pub use record::{AmaFlags, CallerId, CelEventType, EventRecord};
pub use transform::{CanonicalCallerId, CanonicalMessage, event_name, event_time, extra, transform};
