mod quote;
mod quote_request;

pub use quote::{Quote, QuoteChanges, QuoteDraft, QuoteStatus};
pub use quote_request::{
    ConvertQuoteRequest, CreateQuoteRequest, QuoteListQuery, QuoteStatusRequest,
    UpdateQuoteRequest,
};
pub(crate) use quote_request::default_valid_until;
