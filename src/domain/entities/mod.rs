pub mod contact_me;
pub mod fingerprint;
pub mod form_session;
pub mod ledger;
