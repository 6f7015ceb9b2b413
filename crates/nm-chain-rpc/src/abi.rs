//! Call encoding for the deployed name registry.

use alloy_primitives::Address;
use alloy_sol_types::{SolCall, sol};

sol! {
    function register(string name) external payable;
    function setRecord(string name, string record) external;
    function getAllNames() external view returns (string[] names);
    function records(string name) external view returns (string record);
    function domains(string name) external view returns (address owner);
}

pub fn encode_register(name: &str) -> Vec<u8> {
    registerCall {
        name: name.to_owned(),
    }
    .abi_encode()
}

pub fn encode_set_record(name: &str, record: &str) -> Vec<u8> {
    setRecordCall {
        name: name.to_owned(),
        record: record.to_owned(),
    }
    .abi_encode()
}

pub fn encode_get_all_names() -> Vec<u8> {
    getAllNamesCall {}.abi_encode()
}

pub fn encode_records(name: &str) -> Vec<u8> {
    recordsCall {
        name: name.to_owned(),
    }
    .abi_encode()
}

pub fn encode_domains(name: &str) -> Vec<u8> {
    domainsCall {
        name: name.to_owned(),
    }
    .abi_encode()
}

pub fn decode_get_all_names(data: &[u8]) -> Result<Vec<String>, alloy_sol_types::Error> {
    Ok(getAllNamesCall::abi_decode_returns(data, true)?.names)
}

pub fn decode_records(data: &[u8]) -> Result<String, alloy_sol_types::Error> {
    Ok(recordsCall::abi_decode_returns(data, true)?.record)
}

pub fn decode_domains(data: &[u8]) -> Result<Address, alloy_sol_types::Error> {
    Ok(domainsCall::abi_decode_returns(data, true)?.owner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_sol_types::SolValue;

    #[test]
    fn calls_start_with_their_selector() {
        assert_eq!(&encode_register("alice")[..4], &registerCall::SELECTOR[..]);
        assert_eq!(&encode_get_all_names()[..], &getAllNamesCall::SELECTOR[..]);
        assert_ne!(registerCall::SELECTOR, setRecordCall::SELECTOR);
    }

    #[test]
    fn name_list_decodes_from_return_data() {
        let names = vec!["alice".to_owned(), "bob".to_owned()];
        let data = names.abi_encode();
        assert_eq!(decode_get_all_names(&data).unwrap(), names);
    }

    #[test]
    fn truncated_return_data_is_an_error() {
        let data = "wonderland".to_owned().abi_encode();
        assert!(decode_records(&data[..40]).is_err());
    }
}
