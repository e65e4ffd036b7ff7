//! Statements run through the management endpoint.

/// Lets signed-in admins write every table; each policy is created only once.
pub const APPLY_POLICIES: &str = r#"
DO $$
BEGIN
    IF NOT EXISTS (SELECT 1 FROM pg_policies WHERE policyname = 'Admin Manage Services') THEN
        CREATE POLICY "Admin Manage Services" ON public.services FOR ALL TO authenticated USING (true) WITH CHECK (true);
    END IF;
END $$;

DO $$
BEGIN
    IF NOT EXISTS (SELECT 1 FROM pg_policies WHERE policyname = 'Admin Manage Receipts') THEN
        CREATE POLICY "Admin Manage Receipts" ON public.receipts FOR ALL TO authenticated USING (true) WITH CHECK (true);
    END IF;
END $$;

DO $$
BEGIN
    IF NOT EXISTS (SELECT 1 FROM pg_policies WHERE policyname = 'Admin Manage Settings') THEN
        CREATE POLICY "Admin Manage Settings" ON public.settings FOR ALL TO authenticated USING (true) WITH CHECK (true);
    END IF;
END $$;
"#;

pub const UPDATE_SCHEMA: &str = r#"
ALTER TABLE public.receipts ADD COLUMN IF NOT EXISTS "amountPaid" numeric default 0;
ALTER TABLE public.receipts ADD COLUMN IF NOT EXISTS "advancePayment" numeric default 0;
ALTER TABLE public.settings ADD COLUMN IF NOT EXISTS "themePreference" text default 'default';
ALTER TABLE public.settings ADD COLUMN IF NOT EXISTS "darkMode" boolean default false;
"#;

pub const RELOAD_SCHEMA_CACHE: &str = "NOTIFY pgrst, 'reload schema';";

pub const RECEIPT_COLUMNS: &str =
    "SELECT column_name, data_type FROM information_schema.columns WHERE table_name = 'receipts';";

pub const SERVICES_SCHEMA: &str = r#"
SELECT column_name, data_type, column_default, is_nullable
FROM information_schema.columns
WHERE table_name = 'services'
ORDER BY ordinal_position;
"#;
