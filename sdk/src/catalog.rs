//! Product catalog: which products exist and how their amount is priced

use crate::{error::Result, types::Money, FluxPayError};
use serde::{Deserialize, Serialize};

/// Product sold through the default form
pub const GUIA_NOIVA_PRODUCT: &str = "guia_noiva_inteligente";

/// A selectable price point of a product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub key: String,
    pub label: String,
    pub price: Money,
}

/// How a product's amount is determined
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Pricing {
    /// Amount comes from the selected plan; a plan is mandatory
    Plans { plans: Vec<Plan> },
    /// Amount is typed into the currency-masked field
    OpenAmount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub key: String,
    pub name: String,
    pub pricing: Pricing,
}

impl Product {
    #[must_use]
    pub fn plan(&self, key: &str) -> Option<&Plan> {
        match &self.pricing {
            Pricing::Plans { plans } => plans.iter().find(|plan| plan.key == key),
            Pricing::OpenAmount => None,
        }
    }

    #[must_use]
    pub const fn requires_plan(&self) -> bool {
        matches!(self.pricing, Pricing::Plans { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub products: Vec<Product>,
}

impl Catalog {
    #[must_use]
    pub fn product(&self, key: &str) -> Option<&Product> {
        self.products.iter().find(|product| product.key == key)
    }

    /// Load a catalog from its JSON representation
    ///
    /// # Errors
    /// Returns an error if the JSON is invalid, a product key repeats, or a
    /// plan has a non-positive price
    pub fn from_json(json: &str) -> Result<Self> {
        let catalog: Self = serde_json::from_str(json)?;
        catalog.check()?;
        Ok(catalog)
    }

    fn check(&self) -> Result<()> {
        for (index, product) in self.products.iter().enumerate() {
            if self.products[..index].iter().any(|p| p.key == product.key) {
                return Err(FluxPayError::Config(format!(
                    "Duplicate product key in catalog: {}",
                    product.key
                )));
            }
            if let Pricing::Plans { plans } = &product.pricing {
                if plans.is_empty() {
                    return Err(FluxPayError::Config(format!(
                        "Product {} has no plans",
                        product.key
                    )));
                }
                if let Some(plan) = plans.iter().find(|plan| !plan.price.is_positive()) {
                    return Err(FluxPayError::Config(format!(
                        "Plan {} of product {} must have a positive price",
                        plan.key, product.key
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            products: vec![Product {
                key: GUIA_NOIVA_PRODUCT.to_string(),
                name: "Guia da Noiva Inteligente".to_string(),
                pricing: Pricing::Plans {
                    plans: vec![
                        Plan {
                            key: "basic".to_string(),
                            label: "Básico".to_string(),
                            price: Money::from_cents(990),
                        },
                        Plan {
                            key: "premium".to_string(),
                            label: "Premium".to_string(),
                            price: Money::from_cents(1990),
                        },
                    ],
                },
            }],
        }
    }
}
