pub mod supabase;

pub use supabase::{logic_tree_value, SupabaseClient};
