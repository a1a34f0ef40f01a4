//! Documents handled by the users service
//!
//! Field names are PascalCase when written. When read, keys match field
//! names regardless of case, a `null` value leaves the field at its zero
//! value, unknown keys are skipped, and a repeated key overwrites the
//! earlier one.

use std::fmt;

use serde::de::{self, Deserializer, IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::Number;

/// A user record, keyed in storage by `name`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct User {
    pub name: String,
    pub age: i64,
    pub email: String,
    pub password: String,
    pub contact: String,
    pub address: Address,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Address {
    pub city: String,
    pub state: String,
    pub country: String,
    /// Kept as sent, never narrowed to an integer type. Always written as a
    /// number, `0` when absent.
    pub pincode: Number,
}

impl Default for Address {
    fn default() -> Self {
        Self {
            city: String::new(),
            state: String::new(),
            country: String::new(),
            pincode: Number::from(0),
        }
    }
}

/// Overwrite `slot` with the next value unless it is `null`
fn assign<'de, A, T>(map: &mut A, slot: &mut T) -> Result<(), A::Error>
where
    A: MapAccess<'de>,
    T: Deserialize<'de>,
{
    if let Some(value) = map.next_value::<Option<T>>()? {
        *slot = value;
    }
    Ok(())
}

/// A pincode as it may arrive: a JSON number or a string holding one
#[derive(Deserialize)]
#[serde(untagged)]
enum PincodeInput {
    Number(Number),
    Text(String),
}

impl PincodeInput {
    fn into_number<E: de::Error>(self) -> Result<Number, E> {
        match self {
            PincodeInput::Number(n) => Ok(n),
            PincodeInput::Text(text) => text
                .parse::<Number>()
                .map_err(|_| E::custom(format!("invalid number literal {:?} for Pincode", text))),
        }
    }
}

struct UserVisitor;

impl<'de> Visitor<'de> for UserVisitor {
    type Value = User;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a user object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<User, A::Error> {
        let mut user = User::default();
        while let Some(key) = map.next_key::<String>()? {
            match key.to_ascii_lowercase().as_str() {
                "name" => assign(&mut map, &mut user.name)?,
                "age" => assign(&mut map, &mut user.age)?,
                "email" => assign(&mut map, &mut user.email)?,
                "password" => assign(&mut map, &mut user.password)?,
                "contact" => assign(&mut map, &mut user.contact)?,
                "address" => assign(&mut map, &mut user.address)?,
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        Ok(user)
    }
}

impl<'de> Deserialize<'de> for User {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(UserVisitor)
    }
}

struct AddressVisitor;

impl<'de> Visitor<'de> for AddressVisitor {
    type Value = Address;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an address object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Address, A::Error> {
        let mut address = Address::default();
        while let Some(key) = map.next_key::<String>()? {
            match key.to_ascii_lowercase().as_str() {
                "city" => assign(&mut map, &mut address.city)?,
                "state" => assign(&mut map, &mut address.state)?,
                "country" => assign(&mut map, &mut address.country)?,
                "pincode" => {
                    if let Some(input) = map.next_value::<Option<PincodeInput>>()? {
                        address.pincode = input.into_number()?;
                    }
                }
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        Ok(address)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(AddressVisitor)
    }
}
