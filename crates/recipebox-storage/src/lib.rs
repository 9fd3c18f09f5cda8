// SQLite-backed key-value slots
// One row per slot key, the value is whatever text the owner serialized into it

pub mod slots;

pub use slots::SlotTable;
