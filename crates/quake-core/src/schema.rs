use crate::error::{QuakeError, Result};
use crate::types::DataType;
use arrow::datatypes::{Field as ArrowField, Schema as ArrowSchema};

/// Column names of the earthquake event table, in result order
pub const EVENT_COLUMNS: [&str; 7] = [
    "id",
    "time",
    "latitude",
    "longitude",
    "depth",
    "mag",
    "place",
];

pub const TIME_COLUMN: &str = "time";
pub const MAGNITUDE_COLUMN: &str = "mag";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: String,
    data_type: DataType,
    nullable: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: DataType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    pub fn nullable(&self) -> bool {
        self.nullable
    }

    pub fn to_arrow(&self) -> ArrowField {
        ArrowField::new(self.name.clone(), self.data_type.to_arrow(), self.nullable)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Schema of the earthquake event table
    pub fn earthquakes() -> Self {
        Self::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("time", DataType::Timestamp, false),
            Field::new("latitude", DataType::Float64, false),
            Field::new("longitude", DataType::Float64, false),
            Field::new("depth", DataType::Float64, true),
            Field::new("mag", DataType::Float64, false),
            Field::new("place", DataType::Utf8, true),
        ])
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.fields
            .iter()
            .position(|f| f.name() == name)
            .ok_or_else(|| QuakeError::ColumnNotFound(name.to_string()))
    }

    pub fn field_with_name(&self, name: &str) -> Result<&Field> {
        self.fields
            .iter()
            .find(|f| f.name() == name)
            .ok_or_else(|| QuakeError::ColumnNotFound(name.to_string()))
    }

    pub fn to_arrow(&self) -> ArrowSchema {
        let fields: Vec<ArrowField> = self.fields.iter().map(|f| f.to_arrow()).collect();
        ArrowSchema::new(fields)
    }

    pub fn from_arrow(schema: &ArrowSchema) -> Self {
        let fields = schema
            .fields()
            .iter()
            .map(|f| {
                Field::new(
                    f.name(),
                    DataType::from_arrow(f.data_type()),
                    f.is_nullable(),
                )
            })
            .collect();
        Self { fields }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_earthquake_schema_order() {
        let schema = Schema::earthquakes();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, EVENT_COLUMNS.to_vec());
        assert_eq!(schema.index_of(MAGNITUDE_COLUMN).unwrap(), 5);
        assert_eq!(
            schema.field_with_name(TIME_COLUMN).unwrap().data_type(),
            &DataType::Timestamp
        );
    }

    #[test]
    fn test_missing_column() {
        let schema = Schema::earthquakes();
        assert!(matches!(
            schema.index_of("magnitude"),
            Err(QuakeError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_arrow_round_trip() {
        let schema = Schema::earthquakes();
        assert_eq!(Schema::from_arrow(&schema.to_arrow()), schema);
    }
}
