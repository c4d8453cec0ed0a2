pub mod archetype;
pub mod counter;
pub mod oracle;
pub mod win_rates;
