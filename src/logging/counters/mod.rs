mod chat_counters;
mod counters;

pub use chat_counters::ChatCounters;
pub use counters::*;
