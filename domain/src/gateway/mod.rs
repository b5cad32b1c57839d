//! Clients for external collaborators. Downstream call outcomes never feed
//! back into session or affinity bookkeeping.

pub mod appointment;
