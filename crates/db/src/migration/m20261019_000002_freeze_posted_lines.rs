//! Migration extending the posted-line guard to inserts.
//!
//! The first migration only blocked UPDATE and DELETE on lines of a posted
//! entry, so a new line could still be attached to it and unbalance it.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(FREEZE_POSTED_LINES_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(RESTORE_UPDATE_DELETE_GUARD_SQL).await?;
        Ok(())
    }
}

const FREEZE_POSTED_LINES_SQL: &str = r"
-- ============================================================
-- FUNCTION: prevent_posted_line_changes
-- No line of a posted entry may be inserted, changed or removed.
-- On UPDATE both the old and the new parent are checked, so a line
-- cannot be moved into or out of a posted entry either.
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_posted_line_changes()
RETURNS TRIGGER AS $$
DECLARE
    entry_ids UUID[];
    posted_id UUID;
BEGIN
    IF TG_OP = 'INSERT' THEN
        entry_ids := ARRAY[NEW.entry_id];
    ELSIF TG_OP = 'UPDATE' THEN
        entry_ids := ARRAY[OLD.entry_id, NEW.entry_id];
    ELSE
        entry_ids := ARRAY[OLD.entry_id];
    END IF;

    SELECT id INTO posted_id
    FROM journal_entries
    WHERE id = ANY(entry_ids) AND status = 'posted'
    LIMIT 1;

    IF posted_id IS NOT NULL THEN
        RAISE EXCEPTION 'Lines of posted journal entry % cannot be changed', posted_id;
    END IF;

    IF TG_OP = 'DELETE' THEN
        RETURN OLD;
    END IF;
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

DROP TRIGGER IF EXISTS trg_prevent_posted_line_changes ON journal_entry_lines;

CREATE TRIGGER trg_prevent_posted_line_changes
BEFORE INSERT OR UPDATE OR DELETE ON journal_entry_lines
FOR EACH ROW
EXECUTE FUNCTION prevent_posted_line_changes();
";

const RESTORE_UPDATE_DELETE_GUARD_SQL: &str = r"
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

DROP TRIGGER IF EXISTS trg_prevent_posted_line_changes ON journal_entry_lines;

CREATE TRIGGER trg_prevent_posted_line_changes
BEFORE UPDATE OR DELETE ON journal_entry_lines
FOR EACH ROW
EXECUTE FUNCTION prevent_posted_line_changes();
";
