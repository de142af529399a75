//! Cookie consent: the persisted record, its storage and cookie mirror, and
//! the gate that every consent decision flows through.

mod cookie;
mod gate;
mod record;
mod storage;
mod widget;

pub use cookie::{
    Cookie, CookieJar, FileCookieJar, MemoryCookieJar, SameSite, decode_value, encode_value,
};
pub use gate::{ConsentGate, ConsentSettings};
pub use record::{ConsentCategory, ConsentPatch, ConsentRecord};
pub use storage::{ConsentStore, FileConsentStore, MemoryConsentStore, StoredConsent};
pub use widget::ConsentWidgetBridge;
