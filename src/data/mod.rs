pub mod card_index;
pub mod catalog;
pub mod corpus;
