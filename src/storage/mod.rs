pub mod errors;
pub mod record;
pub mod row_id;
pub mod table;
pub mod value_codec;
