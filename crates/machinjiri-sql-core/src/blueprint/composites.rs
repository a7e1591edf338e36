//! Column groups that expand to several primitive declarations.

use super::Blueprint;

impl Blueprint {
    /// Adds nullable `created_at` (defaulting to now) and `updated_at`.
    pub fn timestamps(&mut self) -> &mut Self {
        self.timestamp("created_at")
            .nullable()
            .default_raw("CURRENT_TIMESTAMP");
        self.timestamp("updated_at").nullable();
        self.with_timestamps = true;
        self
    }

    /// Adds a nullable `deleted_at` marker.
    pub fn soft_deletes(&mut self) -> &mut Self {
        self.timestamp("deleted_at").nullable();
        self.with_soft_deletes = true;
        self
    }

    /// Adds `{name}_id` and `{name}_type` plus an index over both.
    pub fn morphs(&mut self, name: &str) -> &mut Self {
        self.add_morphs(name, false)
    }

    /// Like [`morphs`](Self::morphs), with both columns nullable.
    pub fn nullable_morphs(&mut self, name: &str) -> &mut Self {
        self.add_morphs(name, true)
    }

    fn add_morphs(&mut self, name: &str, nullable: bool) -> &mut Self {
        let id = format!("{name}_id");
        let kind = format!("{name}_type");

        let id_column = self.foreign_id(&id);
        if nullable {
            id_column.nullable();
        } else {
            id_column.not_null();
        }
        let type_column = self.string(&kind, 255);
        if nullable {
            type_column.nullable();
        } else {
            type_column.not_null();
        }
        self.index(&[id.as_str(), kind.as_str()])
    }

    /// Adds nullable `created_by` and `updated_by` user references.
    pub fn audit_columns(&mut self) -> &mut Self {
        self.foreign_id("created_by").nullable();
        self.foreign_id("updated_by").nullable();
        self
    }

    /// Adds a `DECIMAL(15,2)` amount and a three-letter `{name}_currency`.
    pub fn currency_amount(&mut self, name: &str, currency: &str) -> &mut Self {
        self.decimal(name, 15, 2).not_null().default(0);
        self.string(&format!("{name}_currency"), 3)
            .not_null()
            .default(currency);
        self
    }

    /// Adds a unique, non-null `VARCHAR(255)` slug column.
    pub fn slug(&mut self, name: &str) -> &mut Self {
        self.string(name, 255).not_null();
        self.unique(&[name])
    }
}
