use crate::domain::model::{AddressComponent, CanonicalGeoFields};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Short,
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonicalField {
    StreetNumber,
    Street,
    City,
    County,
    State,
    Country,
    Zip,
}

/// 標準欄位 / 服務端類型代碼 / 採用的名稱
pub const FIELD_TABLE: [(CanonicalField, &str, Label); 7] = [
    (CanonicalField::StreetNumber, "street_number", Label::Short),
    (CanonicalField::Street, "route", Label::Long),
    (CanonicalField::City, "locality", Label::Short),
    (CanonicalField::County, "administrative_area_level_2", Label::Short),
    (CanonicalField::State, "administrative_area_level_1", Label::Short),
    (CanonicalField::Country, "country", Label::Short),
    (CanonicalField::Zip, "postal_code", Label::Short),
];

fn slot(fields: &mut CanonicalGeoFields, field: CanonicalField) -> &mut Option<String> {
    match field {
        CanonicalField::StreetNumber => &mut fields.street_number,
        CanonicalField::Street => &mut fields.street,
        CanonicalField::City => &mut fields.city,
        CanonicalField::County => &mut fields.county,
        CanonicalField::State => &mut fields.state,
        CanonicalField::Country => &mut fields.country,
        CanonicalField::Zip => &mut fields.zip,
    }
}

/// Maps the first candidate's address components onto the canonical fields.
///
/// Only the primary (first) type code of each component is considered.
/// When a type code repeats, the first component in response order wins.
pub fn normalize(components: &[AddressComponent]) -> CanonicalGeoFields {
    let mut fields = CanonicalGeoFields::default();

    for component in components {
        let Some(type_code) = component.primary_type() else {
            continue;
        };
        let Some((field, _, label)) = FIELD_TABLE.iter().find(|(_, code, _)| *code == type_code)
        else {
            continue;
        };

        // 缺少對應名稱的元件不填值
        let value = match label {
            Label::Short => component.short_name.as_ref(),
            Label::Long => component.long_name.as_ref(),
        };
        let target = slot(&mut fields, *field);
        if let (None, Some(value)) = (target.as_ref(), value) {
            *target = Some(value.clone());
        }
    }

    fields
}
