use crate::display::DisplayRow;
use crate::error::Result;
use crate::models::{validate_fields, validate_value, Entity, FieldValue, Record};

/// Input buffer for one entity's form: one string per schema column plus the
/// focused field.
#[derive(Debug, Clone)]
pub struct EntityForm {
    entity: Entity,
    values: Vec<String>,
    active: usize,
}

impl EntityForm {
    pub fn new(entity: Entity) -> Self {
        Self {
            entity,
            values: vec![String::new(); entity.schema().columns.len()],
            active: 0,
        }
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn value(&self, field: usize) -> &str {
        self.values.get(field).map(String::as_str).unwrap_or_default()
    }

    /// Overwrite a single field, ignoring out-of-range indices.
    pub fn set(&mut self, field: usize, value: impl Into<String>) {
        if let Some(slot) = self.values.get_mut(field) {
            *slot = value.into();
        }
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn focus(&mut self, field: usize) {
        if field < self.values.len() {
            self.active = field;
        }
    }

    pub fn next_field(&mut self) {
        self.active = (self.active + 1) % self.values.len();
    }

    pub fn previous_field(&mut self) {
        self.active = (self.active + self.values.len() - 1) % self.values.len();
    }

    /// Append a character to the active field. Control characters are refused.
    pub fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.values[self.active].push(ch);
        true
    }

    pub fn backspace(&mut self) {
        self.values[self.active].pop();
    }

    /// Empty every field and move focus back to the key.
    pub fn clear(&mut self) {
        for value in &mut self.values {
            value.clear();
        }
        self.active = 0;
    }

    /// Copy a displayed row back into the inputs.
    pub fn fill_from(&mut self, row: &DisplayRow) {
        for (slot, cell) in self.values.iter_mut().zip(&row.cells) {
            slot.clone_from(cell);
        }
    }

    pub fn is_blank(&self) -> bool {
        self.values.iter().all(|value| value.trim().is_empty())
    }

    /// Validate the inputs into a record ready for insertion.
    pub fn parse_record(&self) -> Result<Record> {
        validate_fields(self.entity, &self.values)
    }

    /// Validate the inputs for an update of the row keyed `key`. Whatever is
    /// typed in the key field is ignored: the selected row decides the target,
    /// and its key is kept byte for byte so it still matches the stored row.
    pub fn parse_record_for_key(&self, key: &str) -> Result<Record> {
        let schema = self.entity.schema();
        let mut values = Vec::with_capacity(schema.columns.len());
        values.push(FieldValue::Text(key.to_string()));
        for (column, field) in schema.value_columns().iter().zip(&self.values[1..]) {
            values.push(validate_value(column, field)?);
        }
        Ok(Record::new(self.entity, values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::DisplayList;

    #[test]
    fn test_typing_and_focus_cycle() {
        let mut form = EntityForm::new(Entity::Book);
        for ch in "Dune".chars() {
            form.push_char(ch);
        }
        form.previous_field();
        assert_eq!(form.active(), 4);
        form.next_field();
        form.next_field();
        assert!(form.push_char('H'));
        assert!(!form.push_char('\n'));
        form.backspace();
        form.push_char('F');
        assert_eq!(form.values()[0], "Dune");
        assert_eq!(form.values()[1], "F");
    }

    #[test]
    fn test_clear_resets_every_field() {
        let mut form = EntityForm::new(Entity::Member);
        form.set(2, "2024-01-01");
        form.focus(2);
        form.clear();
        assert!(form.is_blank());
        assert_eq!(form.active(), 0);
    }

    #[test]
    fn test_update_uses_selected_key() {
        let mut list = DisplayList::new();
        let id = list.append(
            ["1984", "Orwell", "Dystopian", "3", "3"]
                .iter()
                .map(|cell| cell.to_string())
                .collect(),
        );
        let mut form = EntityForm::new(Entity::Book);
        form.fill_from(list.get(id).unwrap());
        form.set(0, "Renamed");
        form.set(4, "1");

        let record = form.parse_record_for_key("1984").unwrap();
        assert_eq!(record.key(), "1984");
        assert_eq!(record.values[4], FieldValue::Integer(1));
    }
}
