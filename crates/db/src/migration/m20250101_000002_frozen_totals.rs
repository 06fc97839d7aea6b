//! Freezes invoice snapshots and bill totals.
//!
//! An invoice records the trips and total it was built from; a bill records
//! the total it was issued for. Only the payment columns of a bill may change
//! afterwards.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(INVOICE_FREEZE_TRIGGER_SQL).await?;
        db.execute_unprepared(BILL_TOTAL_FREEZE_TRIGGER_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_SQL).await?;
        Ok(())
    }
}

const INVOICE_FREEZE_TRIGGER_SQL: &str = r"
CREATE OR REPLACE FUNCTION prevent_invoice_changes()
RETURNS TRIGGER AS $$
BEGIN
    IF NEW.client_id IS DISTINCT FROM OLD.client_id
        OR NEW.invoice_date IS DISTINCT FROM OLD.invoice_date
        OR NEW.trip_count IS DISTINCT FROM OLD.trip_count
        OR NEW.total_amount IS DISTINCT FROM OLD.total_amount
    THEN
        RAISE EXCEPTION 'Invoice % is a frozen snapshot and cannot be modified', OLD.id;
    END IF;

    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_invoices_frozen
    BEFORE UPDATE ON invoices
    FOR EACH ROW EXECUTE FUNCTION prevent_invoice_changes();
";

const BILL_TOTAL_FREEZE_TRIGGER_SQL: &str = r"
CREATE OR REPLACE FUNCTION prevent_bill_total_changes()
RETURNS TRIGGER AS $$
BEGIN
    IF NEW.invoice_id IS DISTINCT FROM OLD.invoice_id
        OR NEW.client_id IS DISTINCT FROM OLD.client_id
        OR NEW.total_amount IS DISTINCT FROM OLD.total_amount
    THEN
        RAISE EXCEPTION 'Bill % total and invoice link cannot be modified', OLD.id;
    END IF;

    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_bills_total_frozen
    BEFORE UPDATE ON bills
    FOR EACH ROW EXECUTE FUNCTION prevent_bill_total_changes();
";

const DROP_SQL: &str = r"
DROP TRIGGER IF EXISTS trg_bills_total_frozen ON bills;
DROP TRIGGER IF EXISTS trg_invoices_frozen ON invoices;

DROP FUNCTION IF EXISTS prevent_bill_total_changes();
DROP FUNCTION IF EXISTS prevent_invoice_changes();
";
