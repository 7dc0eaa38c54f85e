/// The 58 Algerian provinces in official numbering order (code = index + 1).
pub const WILAYAS: [&str; 58] = [
    "Adrar",
    "Chlef",
    "Laghouat",
    "Oum El Bouaghi",
    "Batna",
    "Bejaia",
    "Biskra",
    "Bechar",
    "Blida",
    "Bouira",
    "Tamanrasset",
    "Tebessa",
    "Tlemcen",
    "Tiaret",
    "Tizi Ouzou",
    "Alger",
    "Djelfa",
    "Jijel",
    "Setif",
    "Saida",
    "Skikda",
    "Sidi Bel Abbes",
    "Annaba",
    "Guelma",
    "Constantine",
    "Medea",
    "Mostaganem",
    "M'Sila",
    "Mascara",
    "Ouargla",
    "Oran",
    "El Bayadh",
    "Illizi",
    "Bordj Bou Arreridj",
    "Boumerdes",
    "El Tarf",
    "Tindouf",
    "Tissemsilt",
    "El Oued",
    "Khenchela",
    "Souk Ahras",
    "Tipaza",
    "Mila",
    "Ain Defla",
    "Naama",
    "Ain Temouchent",
    "Ghardaia",
    "Relizane",
    "Timimoun",
    "Bordj Badji Mokhtar",
    "Ouled Djellal",
    "Beni Abbes",
    "In Salah",
    "In Guezzam",
    "Touggourt",
    "Djanet",
    "El M'Ghair",
    "El Meniaa",
];

/// Official code of a wilaya given by name (case-insensitive) or by its
/// numeric code.
pub fn code_of(input: &str) -> Option<u8> {
    let input = input.trim();
    if let Ok(code) = input.parse::<u8>() {
        return (1..=WILAYAS.len() as u8).contains(&code).then_some(code);
    }
    WILAYAS
        .iter()
        .position(|name| name.eq_ignore_ascii_case(input))
        .map(|idx| idx as u8 + 1)
}

pub fn is_valid(input: &str) -> bool {
    code_of(input).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_names_and_codes() {
        assert_eq!(code_of("Adrar"), Some(1));
        assert_eq!(code_of("alger"), Some(16));
        assert_eq!(code_of("16"), Some(16));
        assert_eq!(code_of("El Meniaa"), Some(58));
        assert_eq!(code_of("59"), None);
        assert_eq!(code_of("Paris"), None);
    }
}
