use bitcoin::{Amount, BlockHash, Denomination, OutPoint, ScriptBuf, SignedAmount, Txid};

use crate::error::CoreError;
use crate::types::{
    BlockHeight, CanonicalInput, CanonicalOutput, CanonicalTransaction, TransactionSummary,
};

// ==============================================================================
// Wallet Responses
// ==============================================================================

/// Parse a `listtransactions` result array.
pub(super) fn parse_list_transactions(
    raw: serde_json::Value,
) -> Result<Vec<TransactionSummary>, CoreError> {
    if raw.is_null() {
        return Ok(Vec::new());
    }
    let entries = raw.as_array().ok_or_else(|| {
        CoreError::InvalidTxData(format!("listtransactions result is not an array: {raw}"))
    })?;
    entries.iter().map(parse_summary).collect()
}

fn parse_summary(entry: &serde_json::Value) -> Result<TransactionSummary, CoreError> {
    let txid = parse_txid(entry.get("txid"), "txid")?;
    let category = entry
        .get("category")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| CoreError::InvalidTxData(format!("missing category for {txid}")))?
        .to_owned();
    let amount = parse_signed_coin_amount(
        entry
            .get("amount")
            .ok_or_else(|| CoreError::InvalidTxData(format!("missing amount for {txid}")))?,
    )?;
    let fee = entry
        .get("fee")
        .map(parse_signed_coin_amount)
        .transpose()?;

    Ok(TransactionSummary {
        txid,
        account: opt_string(entry.get("account")),
        address: opt_string(entry.get("address")),
        category,
        amount,
        fee,
        vout: parse_integer_optional::<u32, false>(entry.get("vout")),
        confirmations: parse_integer_optional::<i64, true>(entry.get("confirmations")),
        time: parse_integer_optional::<i64, true>(entry.get("time")),
    })
}

// ==============================================================================
// Node Responses
// ==============================================================================

/// Parse a verbose `getrawtransaction` result.
///
/// `block_height` is left as reported; the client fills it in from the block
/// header when the node omits it for a confirmed transaction.
pub(super) fn parse_canonical_transaction(
    raw: &serde_json::Value,
) -> Result<CanonicalTransaction, CoreError> {
    let txid = parse_txid(raw.get("txid"), "txid")?;
    let hex = raw
        .get("hex")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| CoreError::InvalidTxData(format!("missing hex for {txid}")))?
        .to_owned();

    let vin = raw
        .get("vin")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| CoreError::InvalidTxData("missing vin array".into()))?;
    let vout = raw
        .get("vout")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| CoreError::InvalidTxData("missing vout array".into()))?;

    Ok(CanonicalTransaction {
        txid,
        hex,
        version: parse_integer_required::<i32, true>(raw.get("version"), "version")?,
        locktime: parse_integer_required::<u32, false>(raw.get("locktime"), "locktime")?,
        expiry: parse_integer_optional::<u32, false>(raw.get("expiry")),
        block_hash: parse_opt_block_hash(raw.get("blockhash"))?,
        // Unconfirmed transactions may report height 0 instead of omitting it.
        block_height: parse_integer_optional::<u32, false>(raw.get("blockheight"))
            .filter(|height| *height > 0)
            .map(BlockHeight),
        confirmations: parse_integer_optional::<u64, false>(raw.get("confirmations")),
        time: parse_integer_optional::<i64, true>(raw.get("time")),
        block_time: parse_integer_optional::<i64, true>(raw.get("blocktime")),
        inputs: parse_vin(vin)?,
        outputs: parse_vout(vout)?,
    })
}

pub(super) fn parse_block_header_height(raw: &serde_json::Value) -> Option<BlockHeight> {
    parse_integer_optional::<u32, false>(raw.get("height")).map(BlockHeight)
}

/// Input keys that mark newly created coins rather than a spent outpoint.
const GENERATED_INPUT_KEYS: [&str; 4] = ["coinbase", "stakebase", "treasurybase", "treasuryspend"];

fn parse_vin(vin: &[serde_json::Value]) -> Result<Vec<CanonicalInput>, CoreError> {
    vin.iter()
        .map(|input| {
            let sequence = parse_integer_required::<u32, false>(input.get("sequence"), "sequence")?;
            // Coinbase, stakebase and treasury inputs spend no prior output.
            let spends_nothing = GENERATED_INPUT_KEYS
                .iter()
                .any(|key| input.get(*key).is_some());

            let prevout = if spends_nothing {
                None
            } else {
                let prev_txid = parse_txid(input.get("txid"), "vin.txid")?;
                let prev_vout =
                    parse_integer_required::<u32, false>(input.get("vout"), "vin.vout")?;
                Some(OutPoint::new(prev_txid, prev_vout))
            };

            let value = input
                .get("amountin")
                .or_else(|| input.get("prevout").and_then(|p| p.get("value")))
                .and_then(|v| parse_coin_amount(v).ok());

            Ok(CanonicalInput {
                prevout,
                sequence,
                value,
            })
        })
        .collect()
}

fn parse_vout(vout: &[serde_json::Value]) -> Result<Vec<CanonicalOutput>, CoreError> {
    vout.iter()
        .enumerate()
        .map(|(position, output)| {
            let value = parse_coin_amount(
                output
                    .get("value")
                    .ok_or_else(|| CoreError::InvalidTxData("missing value in vout".into()))?,
            )?;
            let n = parse_integer_optional::<u32, false>(output.get("n"))
                .unwrap_or(position as u32);

            let spk = output
                .get("scriptPubKey")
                .ok_or_else(|| CoreError::InvalidTxData("missing scriptPubKey in vout".into()))?;
            let hex_str = spk
                .get("hex")
                .and_then(serde_json::Value::as_str)
                .ok_or_else(|| CoreError::InvalidTxData("missing hex in scriptPubKey".into()))?;
            let script_pub_key = ScriptBuf::from_hex(hex_str)
                .map_err(|e| CoreError::InvalidTxData(format!("invalid scriptPubKey hex: {e}")))?;

            // Some daemons report an `addresses` array, others one `address`.
            let mut addresses: Vec<String> = spk
                .get("addresses")
                .and_then(serde_json::Value::as_array)
                .map(|list| {
                    list.iter()
                        .filter_map(|a| a.as_str().map(str::to_owned))
                        .collect()
                })
                .unwrap_or_default();
            if let Some(address) = opt_string(spk.get("address")) {
                addresses.push(address);
            }

            Ok(CanonicalOutput {
                n,
                value,
                script_pub_key,
                script_type: opt_string(spk.get("type")),
                addresses,
            })
        })
        .collect()
}

// ==============================================================================
// Scalar Helpers
// ==============================================================================

fn opt_string(value: Option<&serde_json::Value>) -> Option<String> {
    value
        .and_then(serde_json::Value::as_str)
        .map(str::to_owned)
}

pub(super) fn parse_txid(
    value: Option<&serde_json::Value>,
    field: &str,
) -> Result<Txid, CoreError> {
    let value = value
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| CoreError::InvalidTxData(format!("missing {field}")))?;
    value
        .parse()
        .map_err(|e| CoreError::InvalidTxData(format!("invalid {field} `{value}`: {e}")))
}

fn parse_opt_block_hash(value: Option<&serde_json::Value>) -> Result<Option<BlockHash>, CoreError> {
    match value.and_then(serde_json::Value::as_str) {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|e| CoreError::InvalidTxData(format!("invalid blockhash: {e}"))),
    }
}

fn parse_integer_required<T, const SIGNED: bool>(
    value: Option<&serde_json::Value>,
    field: &str,
) -> Result<T, CoreError>
where
    T: TryFrom<i64> + TryFrom<u64>,
{
    parse_integer::<T, SIGNED, true>(value, field)?
        .ok_or_else(|| CoreError::InvalidTxData(format!("missing {field}")))
}

fn parse_integer_optional<T, const SIGNED: bool>(value: Option<&serde_json::Value>) -> Option<T>
where
    T: TryFrom<i64> + TryFrom<u64>,
{
    parse_integer::<T, SIGNED, false>(value, "value")
        .ok()
        .flatten()
}

// `REQUIRED=false` treats missing/null/type-mismatch as `Ok(None)`.
fn parse_integer<T, const SIGNED: bool, const REQUIRED: bool>(
    value: Option<&serde_json::Value>,
    field: &str,
) -> Result<Option<T>, CoreError>
where
    T: TryFrom<i64> + TryFrom<u64>,
{
    let missing_or_none = || {
        if REQUIRED {
            Err(CoreError::InvalidTxData(format!("missing {field}")))
        } else {
            Ok(None)
        }
    };

    let Some(value) = value else {
        return missing_or_none();
    };

    if SIGNED {
        let Some(n) = value.as_i64() else {
            return missing_or_none();
        };
        T::try_from(n)
            .map(Some)
            .map_err(|_| CoreError::InvalidTxData(format!("{field} out of range: {n}")))
    } else {
        let Some(n) = value.as_u64() else {
            return missing_or_none();
        };
        T::try_from(n)
            .map(Some)
            .map_err(|_| CoreError::InvalidTxData(format!("{field} out of range: {n}")))
    }
}

/// Parse a whole-coin amount (8 decimal places) from a JSON value.
///
/// Numbers go through `from_float_in` so scientific notation works; strings
/// go through `from_str_in`.
fn parse_coin_amount(value: &serde_json::Value) -> Result<Amount, CoreError> {
    match value {
        serde_json::Value::Number(n) => {
            let parsed = n
                .as_f64()
                .ok_or_else(|| CoreError::InvalidTxData(format!("invalid amount `{value}`")))?;
            Amount::from_float_in(parsed, Denomination::Bitcoin)
                .map_err(|e| CoreError::InvalidTxData(format!("invalid amount `{value}`: {e}")))
        }
        serde_json::Value::String(s) => Amount::from_str_in(s, Denomination::Bitcoin)
            .map_err(|e| CoreError::InvalidTxData(format!("invalid amount `{s}`: {e}"))),
        _ => Err(CoreError::InvalidTxData(format!(
            "expected numeric amount, got: {value}"
        ))),
    }
}

/// Like [`parse_coin_amount`] but allows negative values (wallet sends and fees).
fn parse_signed_coin_amount(value: &serde_json::Value) -> Result<SignedAmount, CoreError> {
    match value {
        serde_json::Value::Number(n) => {
            let parsed = n
                .as_f64()
                .ok_or_else(|| CoreError::InvalidTxData(format!("invalid amount `{value}`")))?;
            SignedAmount::from_float_in(parsed, Denomination::Bitcoin)
                .map_err(|e| CoreError::InvalidTxData(format!("invalid amount `{value}`: {e}")))
        }
        serde_json::Value::String(s) => SignedAmount::from_str_in(s, Denomination::Bitcoin)
            .map_err(|e| CoreError::InvalidTxData(format!("invalid amount `{s}`: {e}"))),
        _ => Err(CoreError::InvalidTxData(format!(
            "expected numeric amount, got: {value}"
        ))),
    }
}
