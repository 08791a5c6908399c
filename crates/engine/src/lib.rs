// Engine: the profile form state machine and everything it needs that is
// not tied to a concrete bot platform or database.

pub mod form;
pub mod presenter;
pub mod session;
pub mod validation;

pub use form::{Identity, ProfileFormEngine, ReferralBonus};
pub use presenter::{BotReply, DynPresenter, Presenter};
pub use session::{FormSession, FormStep, SessionStore};
pub use validation::is_valid_bep20_address;
