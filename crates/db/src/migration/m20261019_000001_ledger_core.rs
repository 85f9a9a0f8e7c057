//! Ledger core migration.
//!
//! Creates the chart of accounts, journal, student ledger and accounting
//! period tables with the unique indexes and triggers that back the
//! application-level checks.

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
        // PART 2: CHART OF ACCOUNTS
        // ============================================================
        db.execute_unprepared(ACCOUNTS_SQL).await?;

        // ============================================================
        // PART 3: JOURNAL
        // ============================================================
        db.execute_unprepared(JOURNAL_ENTRIES_SQL).await?;
        db.execute_unprepared(JOURNAL_ENTRY_LINES_SQL).await?;
        db.execute_unprepared(JOURNAL_ENTRY_SEQUENCES_SQL).await?;

        // ============================================================
        // PART 4: STUDENT LEDGERS
        // ============================================================
        db.execute_unprepared(STUDENT_LEDGERS_SQL).await?;
        db.execute_unprepared(LEDGER_CHARGES_SQL).await?;
        db.execute_unprepared(LEDGER_PAYMENTS_SQL).await?;
        db.execute_unprepared(PAYMENT_LOGS_SQL).await?;
        db.execute_unprepared(OFFICIAL_RECEIPTS_SQL).await?;

        // ============================================================
        // PART 5: ACCOUNTING PERIODS
        // ============================================================
        db.execute_unprepared(ACCOUNTING_PERIODS_SQL).await?;

        // ============================================================
        // PART 6: TRIGGERS & FUNCTIONS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

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
CREATE TYPE account_type AS ENUM ('asset', 'liability', 'equity', 'revenue', 'expense');

CREATE TYPE normal_balance AS ENUM ('debit', 'credit');

CREATE TYPE journal_entry_status AS ENUM ('draft', 'posted', 'rejected');

CREATE TYPE journal_reference_type AS ENUM ('payment', 'expense', 'payroll', 'manual');

CREATE TYPE ledger_status AS ENUM ('Unpaid', 'Partially Paid', 'Fully Paid');

CREATE TYPE ledger_charge_type AS ENUM ('Tuition', 'Misc', 'Other', 'Adjustment', 'Discount');

CREATE TYPE payment_method AS ENUM ('cash', 'check', 'bank_transfer', 'online');
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id UUID PRIMARY KEY,
    code VARCHAR(20) NOT NULL UNIQUE,
    name VARCHAR(255) NOT NULL,
    account_type account_type NOT NULL,
    normal_balance normal_balance NOT NULL,
    parent_id UUID REFERENCES accounts(id),
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_accounts_parent ON accounts(parent_id) WHERE parent_id IS NOT NULL;
";

const JOURNAL_ENTRIES_SQL: &str = r"
CREATE TABLE journal_entries (
    id UUID PRIMARY KEY,
    entry_number VARCHAR(32) NOT NULL,
    entry_date DATE NOT NULL,
    description TEXT NOT NULL,
    reference_type journal_reference_type NOT NULL,
    reference_id UUID,
    status journal_entry_status NOT NULL DEFAULT 'draft',
    created_by UUID NOT NULL,
    approved_by UUID,
    approved_at TIMESTAMPTZ,
    rejected_by UUID,
    rejected_at TIMESTAMPTZ,
    rejection_reason TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_journal_entries_entry_number UNIQUE (entry_number),
    CONSTRAINT chk_posted_has_approver CHECK (status <> 'posted' OR approved_at IS NOT NULL),
    CONSTRAINT chk_rejected_has_reason CHECK (status <> 'rejected' OR rejection_reason IS NOT NULL)
);

-- Expense and payroll postings are idempotent per business event
CREATE UNIQUE INDEX uq_journal_entries_reference
    ON journal_entries(reference_type, reference_id)
    WHERE reference_type IN ('expense', 'payroll') AND status <> 'rejected';

CREATE INDEX idx_journal_entries_status_date ON journal_entries(status, entry_date);
CREATE INDEX idx_journal_entries_reference ON journal_entries(reference_type, reference_id)
    WHERE reference_id IS NOT NULL;
";

const JOURNAL_ENTRY_LINES_SQL: &str = r"
CREATE TABLE journal_entry_lines (
    id UUID PRIMARY KEY,
    entry_id UUID NOT NULL REFERENCES journal_entries(id) ON DELETE CASCADE,
    line_number INTEGER NOT NULL CHECK (line_number >= 1),
    account_id UUID NOT NULL REFERENCES accounts(id),
    debit NUMERIC(15, 2) NOT NULL DEFAULT 0 CHECK (debit >= 0),
    credit NUMERIC(15, 2) NOT NULL DEFAULT 0 CHECK (credit >= 0),
    description TEXT,
    CONSTRAINT uq_journal_entry_lines_number UNIQUE (entry_id, line_number)
);

CREATE INDEX idx_journal_entry_lines_account ON journal_entry_lines(account_id);
";

const JOURNAL_ENTRY_SEQUENCES_SQL: &str = r"
CREATE TABLE journal_entry_sequences (
    year INTEGER PRIMARY KEY,
    last_value BIGINT NOT NULL CHECK (last_value >= 1)
);
";

const STUDENT_LEDGERS_SQL: &str = r"
CREATE TABLE student_ledgers (
    id UUID PRIMARY KEY,
    student_id UUID NOT NULL,
    school_year VARCHAR(20) NOT NULL,
    grade_level SMALLINT CHECK (grade_level BETWEEN 0 AND 12),
    total_charges NUMERIC(15, 2) NOT NULL DEFAULT 0,
    total_payments NUMERIC(15, 2) NOT NULL DEFAULT 0,
    balance NUMERIC(15, 2) NOT NULL DEFAULT 0,
    status ledger_status NOT NULL DEFAULT 'Unpaid',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_student_ledgers_student_year UNIQUE (student_id, school_year),
    CONSTRAINT chk_balance_derived CHECK (balance = total_charges - total_payments)
);

CREATE INDEX idx_student_ledgers_outstanding ON student_ledgers(balance) WHERE balance > 0;
";

const LEDGER_CHARGES_SQL: &str = r"
CREATE TABLE ledger_charges (
    id UUID PRIMARY KEY,
    ledger_id UUID NOT NULL REFERENCES student_ledgers(id) ON DELETE CASCADE,
    charge_type ledger_charge_type NOT NULL,
    amount NUMERIC(15, 2) NOT NULL,
    description TEXT,
    discount_id UUID,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_charge_sign CHECK (
        (charge_type = 'Discount' AND amount < 0) OR (charge_type <> 'Discount' AND amount > 0)
    )
);

-- A configured discount applies at most once per ledger
CREATE UNIQUE INDEX uq_ledger_charges_discount
    ON ledger_charges(ledger_id, discount_id)
    WHERE discount_id IS NOT NULL;

CREATE INDEX idx_ledger_charges_ledger ON ledger_charges(ledger_id);
";

const LEDGER_PAYMENTS_SQL: &str = r"
CREATE TABLE ledger_payments (
    id UUID PRIMARY KEY,
    ledger_id UUID NOT NULL REFERENCES student_ledgers(id) ON DELETE CASCADE,
    amount NUMERIC(15, 2) NOT NULL CHECK (amount > 0),
    or_number VARCHAR(50) NOT NULL,
    method payment_method NOT NULL,
    processed_by UUID,
    paid_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_ledger_payments_or_number UNIQUE (or_number)
);

CREATE INDEX idx_ledger_payments_ledger ON ledger_payments(ledger_id);
";

const PAYMENT_LOGS_SQL: &str = r"
-- Legacy payment log kept for payments recorded before per-year ledgers
CREATE TABLE payment_logs (
    id UUID PRIMARY KEY,
    student_id UUID NOT NULL,
    amount NUMERIC(15, 2) NOT NULL CHECK (amount > 0),
    or_number VARCHAR(50) NOT NULL,
    paid_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_payment_logs_or_number UNIQUE (or_number)
);
";

const OFFICIAL_RECEIPTS_SQL: &str = r"
-- Every issued OR number, across ledger payments and the legacy log
CREATE TABLE official_receipts (
    or_number VARCHAR(50) PRIMARY KEY,
    source VARCHAR(20) NOT NULL CHECK (source IN ('ledger', 'legacy')),
    payment_id UUID NOT NULL,
    issued_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const ACCOUNTING_PERIODS_SQL: &str = r"
CREATE TABLE accounting_periods (
    id UUID PRIMARY KEY,
    year INTEGER NOT NULL,
    month INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
    name VARCHAR(32) NOT NULL,
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    is_closed BOOLEAN NOT NULL DEFAULT false,
    closed_by UUID,
    closed_at TIMESTAMPTZ,
    closing_notes TEXT,
    reopened_by UUID,
    reopened_at TIMESTAMPTZ,
    reopen_reason TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_accounting_periods_year_month UNIQUE (year, month),
    CONSTRAINT chk_period_range CHECK (start_date <= end_date),
    CONSTRAINT chk_closed_has_closer CHECK (NOT is_closed OR closed_at IS NOT NULL)
);

CREATE INDEX idx_accounting_periods_closed ON accounting_periods(start_date, end_date)
    WHERE is_closed;
";

const TRIGGERS_SQL: &str = r"
-- ============================================================
-- FUNCTION: check_journal_entry_balance
-- Posted entries must balance within one cent
-- ============================================================
CREATE OR REPLACE FUNCTION check_journal_entry_balance()
RETURNS TRIGGER AS $$
DECLARE
    total_debit NUMERIC(15, 2);
    total_credit NUMERIC(15, 2);
BEGIN
    IF NEW.status = 'posted' THEN
        SELECT COALESCE(SUM(debit), 0), COALESCE(SUM(credit), 0)
        INTO total_debit, total_credit
        FROM journal_entry_lines
        WHERE entry_id = NEW.id;

        IF ABS(total_debit - total_credit) > 0.01 THEN
            RAISE EXCEPTION 'Journal entry % is not balanced. Debit: %, Credit: %',
                NEW.entry_number, total_debit, total_credit;
        END IF;
    END IF;

    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE CONSTRAINT TRIGGER trg_check_journal_entry_balance
AFTER INSERT OR UPDATE ON journal_entries
DEFERRABLE INITIALLY DEFERRED
FOR EACH ROW
EXECUTE FUNCTION check_journal_entry_balance();

-- ============================================================
-- FUNCTION: prevent_posted_line_changes
-- Lines are immutable once the parent entry is posted
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_posted_line_changes()
RETURNS TRIGGER AS $$
DECLARE
    entry_status journal_entry_status;
BEGIN
    SELECT status INTO entry_status
    FROM journal_entries
    WHERE id = OLD.entry_id;

    IF entry_status = 'posted' THEN
        RAISE EXCEPTION 'Lines of posted journal entry % cannot be changed', OLD.entry_id;
    END IF;

    IF TG_OP = 'DELETE' THEN
        RETURN OLD;
    END IF;
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_prevent_posted_line_changes
BEFORE UPDATE OR DELETE ON journal_entry_lines
FOR EACH ROW
EXECUTE FUNCTION prevent_posted_line_changes();

-- ============================================================
-- FUNCTION: lock_normal_balance
-- An account's normal balance cannot change once lines reference it
-- ============================================================
CREATE OR REPLACE FUNCTION lock_normal_balance()
RETURNS TRIGGER AS $$
BEGIN
    IF NEW.normal_balance <> OLD.normal_balance
        AND EXISTS (SELECT 1 FROM journal_entry_lines WHERE account_id = OLD.id) THEN
        RAISE EXCEPTION 'Normal balance of account % is locked', OLD.code;
    END IF;
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_lock_normal_balance
BEFORE UPDATE ON accounts
FOR EACH ROW
EXECUTE FUNCTION lock_normal_balance();
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS accounting_periods CASCADE;
DROP TABLE IF EXISTS official_receipts CASCADE;
DROP TABLE IF EXISTS payment_logs CASCADE;
DROP TABLE IF EXISTS ledger_payments CASCADE;
DROP TABLE IF EXISTS ledger_charges CASCADE;
DROP TABLE IF EXISTS student_ledgers CASCADE;
DROP TABLE IF EXISTS journal_entry_sequences CASCADE;
DROP TABLE IF EXISTS journal_entry_lines CASCADE;
DROP TABLE IF EXISTS journal_entries CASCADE;
DROP TABLE IF EXISTS accounts CASCADE;

DROP FUNCTION IF EXISTS check_journal_entry_balance() CASCADE;
DROP FUNCTION IF EXISTS prevent_posted_line_changes() CASCADE;
DROP FUNCTION IF EXISTS lock_normal_balance() CASCADE;

DROP TYPE IF EXISTS payment_method;
DROP TYPE IF EXISTS ledger_charge_type;
DROP TYPE IF EXISTS ledger_status;
DROP TYPE IF EXISTS journal_reference_type;
DROP TYPE IF EXISTS journal_entry_status;
DROP TYPE IF EXISTS normal_balance;
DROP TYPE IF EXISTS account_type;
";
