//! The mutable order form.
//!
//! Fields are private so that the one rule that spans them holds everywhere: a
//! product selection never survives a change of category.

/// Inclusive quantity bounds for a submittable form
pub const QUANTITY_RANGE: std::ops::RangeInclusive<i64> = 1..=10;

/// Form state owned by a view model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderForm {
    category_id: Option<i64>,
    product_id: Option<i64>,
    quantity: i64,
    comment: String,
}

impl Default for OrderForm {
    fn default() -> Self {
        Self {
            category_id: None,
            product_id: None,
            quantity: 1,
            comment: String::new(),
        }
    }
}

impl OrderForm {
    /// Builds a form from explicit values, e.g. to prefill it.
    #[must_use]
    pub const fn from_parts(
        category_id: Option<i64>,
        product_id: Option<i64>,
        quantity: i64,
        comment: String,
    ) -> Self {
        Self {
            category_id,
            product_id,
            quantity,
            comment,
        }
    }

    /// Selected category
    #[must_use]
    pub const fn category_id(&self) -> Option<i64> {
        self.category_id
    }

    /// Selected product
    #[must_use]
    pub const fn product_id(&self) -> Option<i64> {
        self.product_id
    }

    /// Requested quantity
    #[must_use]
    pub const fn quantity(&self) -> i64 {
        self.quantity
    }

    /// Free-form comment
    #[must_use]
    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Selects a category. Returns `true` if the selection changed, in which case the
    /// product selection has been cleared.
    pub fn set_category_id(&mut self, category_id: Option<i64>) -> bool {
        if self.category_id == category_id {
            return false;
        }
        self.category_id = category_id;
        self.product_id = None;
        true
    }

    /// Selects a product within the current category.
    pub const fn set_product_id(&mut self, product_id: Option<i64>) {
        self.product_id = product_id;
    }

    /// Sets the quantity. Out-of-range values are accepted and make the form invalid.
    pub const fn set_quantity(&mut self, quantity: i64) {
        self.quantity = quantity;
    }

    /// Replaces the comment.
    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = comment.into();
    }

    /// Restores `{None, None, 1, ""}`.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// A form is submittable once both selections are made and the quantity is in range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.category_id.is_some()
            && self.product_id.is_some()
            && QUANTITY_RANGE.contains(&self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_form() {
        let form = OrderForm::default();
        assert_eq!(form.category_id(), None);
        assert_eq!(form.product_id(), None);
        assert_eq!(form.quantity(), 1);
        assert_eq!(form.comment(), "");
        assert!(!form.is_valid());
    }

    #[test]
    fn test_same_category_keeps_product() {
        let mut form = OrderForm::from_parts(Some(1), Some(101), 2, String::new());
        assert!(!form.set_category_id(Some(1)));
        assert_eq!(form.product_id(), Some(101));

        assert!(form.set_category_id(Some(2)));
        assert_eq!(form.product_id(), None);
    }

    #[test]
    fn test_quantity_bounds() {
        let mut form = OrderForm::from_parts(Some(1), Some(101), 5, String::new());
        assert!(form.is_valid());

        form.set_quantity(11);
        assert!(!form.is_valid());
        form.set_quantity(0);
        assert!(!form.is_valid());
        form.set_quantity(10);
        assert!(form.is_valid());
    }

    #[derive(Debug, Clone)]
    enum Edit {
        Category(Option<i64>),
        Product(Option<i64>),
        Quantity(i64),
        Comment(String),
        Reset,
    }

    fn edit() -> impl Strategy<Value = Edit> {
        prop_oneof![
            proptest::option::of(1_i64..5).prop_map(Edit::Category),
            proptest::option::of(100_i64..110).prop_map(Edit::Product),
            (-3_i64..15).prop_map(Edit::Quantity),
            "[a-z ]{0,8}".prop_map(Edit::Comment),
            Just(Edit::Reset),
        ]
    }

    proptest! {
        #[test]
        fn category_switch_always_clears_product(edits in proptest::collection::vec(edit(), 0..40)) {
            let mut form = OrderForm::default();
            for e in edits {
                match e {
                    Edit::Category(id) => {
                        let before = form.category_id();
                        form.set_category_id(id);
                        if before != id {
                            prop_assert_eq!(form.product_id(), None);
                        }
                    }
                    Edit::Product(id) => form.set_product_id(id),
                    Edit::Quantity(q) => form.set_quantity(q),
                    Edit::Comment(c) => form.set_comment(c),
                    Edit::Reset => {
                        form.reset();
                        prop_assert_eq!(&form, &OrderForm::default());
                    }
                }
                let expected = form.category_id().is_some()
                    && form.product_id().is_some()
                    && (1..=10).contains(&form.quantity());
                prop_assert_eq!(form.is_valid(), expected);
            }
        }
    }
}
