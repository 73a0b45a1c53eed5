use dbops_core::SqlWriter;

pub struct SqliteSqlWriter {}

impl SqlWriter for SqliteSqlWriter {
    fn write_transaction_begin(&self, out: &mut String) {
        // Writer lock is held from the start of the transaction
        out.push_str("BEGIN IMMEDIATE");
    }
}
