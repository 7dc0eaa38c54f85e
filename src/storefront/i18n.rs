use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    models::{StockStatus, UnknownVariant},
    storefront::store::KeyValueStore,
};

pub const LANGUAGE_KEY: &str = "gymfog_language";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Fr,
    Ar,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::En, Language::Fr, Language::Ar];

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Fr => "fr",
            Language::Ar => "ar",
        }
    }

    pub fn is_rtl(&self) -> bool {
        matches!(self, Language::Ar)
    }

    /// Saved preference, English when none or unreadable.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match store.get(LANGUAGE_KEY) {
            Ok(Some(code)) => code.trim().parse().unwrap_or_else(|err| {
                tracing::warn!(error = %err, "ignoring stored language");
                Language::default()
            }),
            Ok(None) => Language::default(),
            Err(err) => {
                tracing::warn!(error = %err, "failed to read stored language");
                Language::default()
            }
        }
    }

    pub fn save(&self, store: &dyn KeyValueStore) {
        if let Err(err) = store.set(LANGUAGE_KEY, self.code()) {
            tracing::warn!(error = %err, "failed to persist language");
        }
    }
}

impl FromStr for Language {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|lang| lang.code() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    OutOfStock,
    InStock,
    OnlyLeft(i32),
    CartEmpty,
}

impl Message {
    pub fn key(&self) -> &'static str {
        match self {
            Message::OutOfStock => "out_of_stock",
            Message::InStock => "in_stock",
            Message::OnlyLeft(_) => "only_left",
            Message::CartEmpty => "cart_empty",
        }
    }
}

fn template(lang: Language, message: Message) -> &'static str {
    match (lang, message) {
        (Language::En, Message::OutOfStock) => "Out of stock",
        (Language::En, Message::InStock) => "In stock",
        (Language::En, Message::OnlyLeft(_)) => "Only {count} left",
        (Language::En, Message::CartEmpty) => "Your cart is empty",
        (Language::Fr, Message::OutOfStock) => "Rupture de stock",
        (Language::Fr, Message::InStock) => "En stock",
        (Language::Fr, Message::OnlyLeft(_)) => "Plus que {count} en stock",
        (Language::Fr, Message::CartEmpty) => "Votre panier est vide",
        (Language::Ar, Message::OutOfStock) => "نفد من المخزون",
        (Language::Ar, Message::InStock) => "متوفر",
        (Language::Ar, Message::OnlyLeft(_)) => "تبقى {count} فقط",
        (Language::Ar, Message::CartEmpty) => "سلة التسوق فارغة",
    }
}

pub fn translate(lang: Language, message: Message) -> String {
    let text = template(lang, message);
    match message {
        Message::OnlyLeft(count) => text.replace("{count}", &count.to_string()),
        _ => text.to_string(),
    }
}

/// Badge text for a product with `quantity` units left.
pub fn stock_label(lang: Language, quantity: i32) -> String {
    let message = match StockStatus::from_quantity(quantity) {
        StockStatus::OutOfStock => Message::OutOfStock,
        StockStatus::LowStock => Message::OnlyLeft(quantity),
        StockStatus::InStock => Message::InStock,
    };
    translate(lang, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storefront::store::MemoryStore;

    #[test]
    fn only_left_interpolates_count() {
        assert_eq!(translate(Language::En, Message::OnlyLeft(3)), "Only 3 left");
        assert_eq!(stock_label(Language::Fr, 2), "Plus que 2 en stock");
        assert_eq!(stock_label(Language::En, 0), "Out of stock");
        assert_eq!(stock_label(Language::En, 6), "In stock");
    }

    #[test]
    fn language_preference_persists() {
        let store = MemoryStore::new();
        assert_eq!(Language::load(&store), Language::En);
        Language::Ar.save(&store);
        let lang = Language::load(&store);
        assert_eq!(lang, Language::Ar);
        assert!(lang.is_rtl());
        assert!(!Language::Fr.is_rtl());
    }
}
