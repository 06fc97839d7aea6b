//! Ledger store schema.
//!
//! Creates the trip, invoice, bill, and payment entry tables together with the
//! constraints and triggers that keep invoiced trips frozen and balances
//! conserved.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: TABLES
        // ============================================================
        db.execute_unprepared(INVOICES_SQL).await?;
        db.execute_unprepared(TRIPS_SQL).await?;
        db.execute_unprepared(BILLS_SQL).await?;
        db.execute_unprepared(PAYMENT_ENTRIES_SQL).await?;

        // ============================================================
        // PART 3: TRIGGERS
        // ============================================================
        db.execute_unprepared(TRIP_FREEZE_TRIGGER_SQL).await?;
        db.execute_unprepared(TOUCH_UPDATED_AT_SQL).await?;
        db.execute_unprepared(PAYMENT_ENTRY_APPEND_ONLY_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE payment_status AS ENUM ('UNPAID', 'PARTIAL', 'PAID');

CREATE TYPE payment_target AS ENUM ('BILL', 'TRIP');

CREATE TYPE payment_mode AS ENUM (
    'CASH',
    'UPI',
    'BANK_TRANSFER',
    'CHEQUE',
    'CARD',
    'ADJUSTMENT'
);

CREATE TYPE entry_kind AS ENUM ('FULL', 'PARTIAL');
";

const INVOICES_SQL: &str = r"
CREATE TABLE invoices (
    id UUID PRIMARY KEY,
    client_id UUID NOT NULL,
    invoice_date DATE NOT NULL,
    trip_count INTEGER NOT NULL,
    total_amount NUMERIC(14, 2) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_invoices_trip_count CHECK (trip_count > 0),
    CONSTRAINT chk_invoices_total CHECK (total_amount >= 0)
);

CREATE INDEX idx_invoices_client_date ON invoices(client_id, invoice_date);
";

const TRIPS_SQL: &str = r"
CREATE TABLE trips (
    id UUID PRIMARY KEY,
    client_id UUID NOT NULL,
    trip_date DATE NOT NULL,
    origin TEXT,
    destination TEXT,
    vehicle_no VARCHAR(32),
    total_amount NUMERIC(14, 2) NOT NULL,
    paid_amount NUMERIC(14, 2) NOT NULL DEFAULT 0,
    invoice_id UUID REFERENCES invoices(id) ON DELETE RESTRICT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_trips_total CHECK (total_amount >= 0),
    CONSTRAINT chk_trips_paid CHECK (paid_amount >= 0 AND paid_amount <= total_amount)
);

CREATE INDEX idx_trips_unbilled ON trips(client_id, trip_date) WHERE invoice_id IS NULL;
CREATE INDEX idx_trips_invoice ON trips(invoice_id) WHERE invoice_id IS NOT NULL;
";

const BILLS_SQL: &str = r"
CREATE TABLE bills (
    id UUID PRIMARY KEY,
    invoice_id UUID NOT NULL REFERENCES invoices(id) ON DELETE RESTRICT,
    client_id UUID NOT NULL,
    bill_date DATE NOT NULL,
    due_date DATE NOT NULL,
    total_amount NUMERIC(14, 2) NOT NULL,
    paid_amount NUMERIC(14, 2) NOT NULL DEFAULT 0,
    pending_amount NUMERIC(14, 2) NOT NULL,
    payment_status payment_status NOT NULL DEFAULT 'UNPAID',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_bills_invoice UNIQUE (invoice_id),
    CONSTRAINT chk_bills_due_date CHECK (due_date >= bill_date),
    CONSTRAINT chk_bills_paid CHECK (paid_amount >= 0),
    CONSTRAINT chk_bills_pending CHECK (pending_amount >= 0),
    CONSTRAINT chk_bills_conserved CHECK (paid_amount + pending_amount = total_amount)
);

CREATE INDEX idx_bills_client_date ON bills(client_id, bill_date);
CREATE INDEX idx_bills_open_due ON bills(due_date) WHERE payment_status <> 'PAID';
";

const PAYMENT_ENTRIES_SQL: &str = r"
CREATE TABLE payment_entries (
    id UUID PRIMARY KEY,
    target_type payment_target NOT NULL,
    target_id UUID NOT NULL,
    amount NUMERIC(14, 2) NOT NULL,
    payment_mode payment_mode NOT NULL,
    entry_kind entry_kind NOT NULL,
    reference_no VARCHAR(100),
    remarks TEXT,
    recorded_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_payment_entries_amount CHECK (amount <> 0)
);

CREATE INDEX idx_payment_entries_target ON payment_entries(target_type, target_id, recorded_at DESC);
";

const TRIP_FREEZE_TRIGGER_SQL: &str = r"
CREATE OR REPLACE FUNCTION prevent_invoiced_trip_changes()
RETURNS TRIGGER AS $$
BEGIN
    IF TG_OP = 'DELETE' THEN
        IF OLD.invoice_id IS NOT NULL THEN
            RAISE EXCEPTION 'Trip % is invoiced and cannot be deleted', OLD.id;
        END IF;
        RETURN OLD;
    END IF;

    IF OLD.invoice_id IS NOT NULL AND (
        NEW.client_id IS DISTINCT FROM OLD.client_id
        OR NEW.trip_date IS DISTINCT FROM OLD.trip_date
        OR NEW.total_amount IS DISTINCT FROM OLD.total_amount
        OR NEW.invoice_id IS DISTINCT FROM OLD.invoice_id
    ) THEN
        RAISE EXCEPTION 'Trip % is invoiced and cannot be modified', OLD.id;
    END IF;

    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_trips_frozen_after_invoice
    BEFORE UPDATE OR DELETE ON trips
    FOR EACH ROW EXECUTE FUNCTION prevent_invoiced_trip_changes();
";

const TOUCH_UPDATED_AT_SQL: &str = r"
CREATE OR REPLACE FUNCTION touch_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = now();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_trips_updated_at
    BEFORE UPDATE ON trips
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();

CREATE TRIGGER trg_bills_updated_at
    BEFORE UPDATE ON bills
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
";

const PAYMENT_ENTRY_APPEND_ONLY_SQL: &str = r"
CREATE OR REPLACE FUNCTION prevent_payment_entry_update()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'Payment entries are append-only';
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_payment_entries_append_only
    BEFORE UPDATE ON payment_entries
    FOR EACH ROW EXECUTE FUNCTION prevent_payment_entry_update();
";

const DROP_ALL_SQL: &str = r"
DROP TRIGGER IF EXISTS trg_payment_entries_append_only ON payment_entries;
DROP TRIGGER IF EXISTS trg_bills_updated_at ON bills;
DROP TRIGGER IF EXISTS trg_trips_updated_at ON trips;
DROP TRIGGER IF EXISTS trg_trips_frozen_after_invoice ON trips;

DROP FUNCTION IF EXISTS prevent_payment_entry_update();
DROP FUNCTION IF EXISTS touch_updated_at();
DROP FUNCTION IF EXISTS prevent_invoiced_trip_changes();

DROP TABLE IF EXISTS payment_entries;
DROP TABLE IF EXISTS bills;
DROP TABLE IF EXISTS trips;
DROP TABLE IF EXISTS invoices;

DROP TYPE IF EXISTS entry_kind;
DROP TYPE IF EXISTS payment_mode;
DROP TYPE IF EXISTS payment_target;
DROP TYPE IF EXISTS payment_status;
";
