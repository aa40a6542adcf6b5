use std::fmt;

use chrono::NaiveDate;

use crate::error::Result;
use crate::validation;

/// Editable person fields. Used both to create a person (or member) and to
/// replace all of its contact details at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonDetails {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub email: String,
    pub phone_number: String,
}

impl PersonDetails {
    /// Check every field and return the normalized copy. Email uniqueness is
    /// an extent-wide rule and is checked by the library.
    pub(crate) fn validated(&self, today: NaiveDate) -> Result<Self> {
        Ok(Self {
            first_name: validation::name("first name", &self.first_name)?,
            last_name: validation::name("last name", &self.last_name)?,
            date_of_birth: validation::date_of_birth(self.date_of_birth, today)?,
            email: validation::email(&self.email)?,
            phone_number: validation::phone_number(&self.phone_number)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) date_of_birth: NaiveDate,
    pub(crate) email: String,
    pub(crate) phone_number: String,
}

impl Person {
    pub(crate) fn from_details(details: PersonDetails) -> Self {
        Self {
            first_name: details.first_name,
            last_name: details.last_name,
            date_of_birth: details.date_of_birth,
            email: details.email,
            phone_number: details.phone_number,
        }
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn date_of_birth(&self) -> NaiveDate {
        self.date_of_birth
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone_number(&self) -> &str {
        &self.phone_number
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn details(&self) -> PersonDetails {
        PersonDetails {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            date_of_birth: self.date_of_birth,
            email: self.email.clone(),
            phone_number: self.phone_number.clone(),
        }
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} <{}>", self.first_name, self.last_name, self.email)
    }
}
