pub mod error;
pub mod events;
pub mod geo_util;
pub mod link_table;
pub mod links;
pub mod node_table;
pub mod stop_index;
