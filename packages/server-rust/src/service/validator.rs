//! Per-field request validators.

use std::fmt;
use std::sync::Arc;

use opcodec_core::{HttpError, ValidationField};
use serde_json::Value;

type ValidateFn = dyn Fn(&Value) -> Result<(), Value> + Send + Sync;

/// A validation function over the JSON view of one request field.
///
/// `Err` carries the error details placed in the 400 response body.
#[derive(Clone)]
pub struct Validator(Arc<ValidateFn>);

impl Validator {
    pub fn new<F>(validate: F) -> Self
    where
        F: Fn(&Value) -> Result<(), Value> + Send + Sync + 'static,
    {
        Self(Arc::new(validate))
    }

    /// Validator from a boolean predicate and a function producing the error
    /// details when the predicate fails.
    pub fn predicate<P, E>(predicate: P, errors: E) -> Self
    where
        P: Fn(&Value) -> bool + Send + Sync + 'static,
        E: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Self::new(move |data| {
            if predicate(data) {
                Ok(())
            } else {
                Err(errors(data))
            }
        })
    }

    /// # Errors
    ///
    /// Returns the validator's error details when `data` is rejected.
    pub fn validate(&self, data: &Value) -> Result<(), Value> {
        (self.0)(data)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Validator")
    }
}

/// Optional validators for each request field. Absent validators pass.
#[derive(Debug, Clone, Default)]
pub struct Validators {
    pub path: Option<Validator>,
    pub query: Option<Validator>,
    pub header: Option<Validator>,
    pub cookie: Option<Validator>,
    pub authorizer: Option<Validator>,
    pub body: Option<Validator>,
}

impl Validators {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, field: ValidationField, validator: Validator) -> Self {
        *self.slot(field) = Some(validator);
        self
    }

    fn slot(&mut self, field: ValidationField) -> &mut Option<Validator> {
        match field {
            ValidationField::Path => &mut self.path,
            ValidationField::QueryString => &mut self.query,
            ValidationField::Header => &mut self.header,
            ValidationField::Cookie => &mut self.cookie,
            ValidationField::Authorizer => &mut self.authorizer,
            ValidationField::Body => &mut self.body,
        }
    }

    fn get(&self, field: ValidationField) -> Option<&Validator> {
        match field {
            ValidationField::Path => self.path.as_ref(),
            ValidationField::QueryString => self.query.as_ref(),
            ValidationField::Header => self.header.as_ref(),
            ValidationField::Cookie => self.cookie.as_ref(),
            ValidationField::Authorizer => self.authorizer.as_ref(),
            ValidationField::Body => self.body.as_ref(),
        }
    }

    /// Run the validator for `field`, if any. `data` is only built when a
    /// validator is present.
    pub(crate) fn check<F>(&self, field: ValidationField, data: F) -> Result<(), HttpError>
    where
        F: FnOnce() -> Value,
    {
        match self.get(field) {
            Some(validator) => validator
                .validate(&data())
                .map_err(|details| HttpError::validation(field, details)),
            None => Ok(()),
        }
    }
}
