//! Solidity call interfaces for every contract the builders target.
//!
//! Uses alloy's `sol!` macro to generate type-safe ABI encoders/decoders.
//! The interfaces are fixed; changing a signature changes every selector
//! derived from it.

use alloy::sol;

sol! {
    /// Canonical pool identity as stored by the pool manager.
    struct PoolKey {
        address currency0;
        address currency1;
        uint24 fee;
        int24 tickSpacing;
        address hooks;
    }

    struct SwapParams {
        bool zeroForOne;
        int256 amountSpecified;
        uint160 sqrtPriceLimitX96;
    }

    interface IERC20 {
        function transfer(address to, uint256 amount) external returns (bool);
        function approve(address spender, uint256 amount) external returns (bool);
        function balanceOf(address account) external view returns (uint256);
    }

    interface ITokenMessenger {
        function depositForBurn(
            uint256 amount, uint32 destinationDomain, bytes32 mintRecipient, address burnToken
        ) external returns (uint64 nonce);
    }

    interface IPoolManager {
        function initialize(PoolKey memory key, uint160 sqrtPriceX96) external returns (int24 tick);
        function swap(PoolKey memory key, SwapParams memory params, bytes calldata hookData) external returns (int256 delta);
    }

    interface IBuyback {
        function executeBuyback(uint256 usdcAmount, uint256 minConsulOut) external;
        function getQuote(uint256 usdcAmount) external view returns (uint256 consulAmount);
        function totalBurned() external view returns (uint256);
    }

    interface IHubDAO {
        function proposeBudget(uint256 amount) external;
    }

    interface IAntiRugHook {
        function initializeVesting(
            PoolKey calldata key, address founder, uint256 cliffDuration,
            uint256 vestingDuration, uint256 totalLocked
        ) external;
        function getVestingStatus(PoolKey calldata key) external view returns (
            bool initialized, address founder, uint256 totalLocked, uint256 vested,
            uint256 released, uint256 available, uint256 timeUntilFullyVested
        );
    }

    interface INameRegistry {
        function setSubnodeRecord(bytes32 node, bytes32 label, address owner, address resolver, uint64 ttl) external;
        function owner(bytes32 node) external view returns (address);
    }

    interface IChannelCustody {
        function deposit(address account, address token, uint256 amount) external payable;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::sol_types::SolCall;

    #[test]
    fn test_well_known_selectors() {
        // transfer(address,uint256) / approve(address,uint256) / balanceOf(address)
        assert_eq!(IERC20::transferCall::SELECTOR, [0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(IERC20::approveCall::SELECTOR, [0x09, 0x5e, 0xa7, 0xb3]);
        assert_eq!(IERC20::balanceOfCall::SELECTOR, [0x70, 0xa0, 0x82, 0x31]);
    }

    #[test]
    fn test_selectors_are_distinct() {
        let selectors = [
            IBuyback::executeBuybackCall::SELECTOR,
            IBuyback::getQuoteCall::SELECTOR,
            IHubDAO::proposeBudgetCall::SELECTOR,
            IPoolManager::initializeCall::SELECTOR,
            IPoolManager::swapCall::SELECTOR,
            IAntiRugHook::initializeVestingCall::SELECTOR,
            INameRegistry::setSubnodeRecordCall::SELECTOR,
            IChannelCustody::depositCall::SELECTOR,
        ];
        for (i, a) in selectors.iter().enumerate() {
            for b in &selectors[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
