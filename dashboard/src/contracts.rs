//! Contract ABIs consumed by the dashboard.
//!
//! Vault shares are themselves an ERC-20, so share balances go through the
//! same `balanceOf` encoding as the stablecoin.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{sol, SolCall};

sol! {
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256 balance);
        function allowance(address owner, address spender) external view returns (uint256 remaining);
        function approve(address spender, uint256 amount) external returns (bool success);
    }

    interface IComptroller {
        function buyShares(uint256 investmentAmount, uint256 minSharesQuantity) external returns (uint256 sharesReceived);
        function redeemSharesForSpecificAssets(
            address recipient,
            uint256 sharesQuantity,
            address[] payoutAssets,
            uint256[] payoutAssetPercentages
        ) external returns (uint256[] payoutAmounts);
    }
}

pub fn balance_of(account: Address) -> Bytes {
    IERC20::balanceOfCall { account }.abi_encode().into()
}

pub fn allowance(owner: Address, spender: Address) -> Bytes {
    IERC20::allowanceCall { owner, spender }.abi_encode().into()
}

pub fn approve(spender: Address, amount: U256) -> Bytes {
    IERC20::approveCall { spender, amount }.abi_encode().into()
}

pub fn buy_shares(investment_amount: U256, min_shares_quantity: U256) -> Bytes {
    IComptroller::buySharesCall {
        investmentAmount: investment_amount,
        minSharesQuantity: min_shares_quantity,
    }
    .abi_encode()
    .into()
}

pub fn redeem_shares_for_specific_assets(
    recipient: Address,
    shares_quantity: U256,
    payout_asset: Address,
    payout_bps: u64,
) -> Bytes {
    IComptroller::redeemSharesForSpecificAssetsCall {
        recipient,
        sharesQuantity: shares_quantity,
        payoutAssets: vec![payout_asset],
        payoutAssetPercentages: vec![U256::from(payout_bps)],
    }
    .abi_encode()
    .into()
}

/// Decodes the single `uint256` returned by `balanceOf` and `allowance`.
pub fn decode_uint(data: &[u8]) -> Result<U256, alloy_sol_types::Error> {
    IERC20::balanceOfCall::abi_decode_returns(data, true).map(|ret| ret.balance)
}
