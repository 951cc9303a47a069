pub mod address;
pub mod cart;
pub mod influencer;
pub mod mystery_box;
pub mod order;
pub mod status;
pub mod ticket;
pub mod user;

pub use address::{Address, AddressSnapshot, AddressType};
pub use cart::{CartCoupon, CartItem};
pub use influencer::{Influencer, InfluencerStatus, Platform};
pub use mystery_box::{Gender, MysteryBox, Review};
pub use order::{Order, OrderItem, OrderStatus, PaymentMethod, TimelineEntry};
pub use ticket::{AuthorRole, CustomerTicket, InternalNote, SupportTicket, TicketCategory, TicketMessage, TicketPriority, TicketStatus};
pub use user::{User, UserProfile};
