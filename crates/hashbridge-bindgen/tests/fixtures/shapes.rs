// Generated by hashbridge-bindgen. Do not edit.
//
// 3 types, 0 excluded members.

#[allow(dead_code, non_camel_case_types, clippy::all)]
pub mod host {
    #[allow(dead_code, non_camel_case_types, clippy::all)]
    pub mod services {
        /// `Host.Services.IConfig`
        #[repr(transparent)]
        pub struct IConfig(hashbridge_abi::system::Object);

        impl ::std::ops::Deref for IConfig {
            type Target = hashbridge_abi::system::Object;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl hashbridge_abi::ObjectHash for IConfig {
            fn type_id() -> hashbridge_abi::TypeId {
                hashbridge_abi::TypeId::from_raw(0xd543defcc178a147)
            }
        }

        impl hashbridge_abi::FromObject for IConfig {
            unsafe fn from_object_unchecked(object: hashbridge_abi::system::Object) -> Self {
                Self(object)
            }
        }

        impl IConfig {
            /// The host's shared instance.
            pub fn instance() -> hashbridge_abi::InteropResult<Self> {
                let init = hashbridge_abi::ObjectInit::empty(<Self as hashbridge_abi::ObjectHash>::type_id());
                hashbridge_abi::boundary::construct(&init)?.downcast()
            }
        }

        // impl Host.Services.IConfig
        impl IConfig {
            /// `get_ModId()`
            pub fn get_mod_id(&self) -> hashbridge_abi::InteropResult<::std::option::Option<hashbridge_abi::system::String>> {
                const METHOD: hashbridge_abi::MethodId = hashbridge_abi::MethodId::from_raw(0x83c1e998b284e252);
                let ty = <Self as hashbridge_abi::ObjectHash>::type_id();
                hashbridge_abi::boundary::call_function(ty, METHOD, self.0.handle())?.downcast_nullable()
            }
        }
    }

    #[allow(dead_code, non_camel_case_types, clippy::all)]
    pub mod shapes {
        /// `Host.Shapes.IShape`
        #[repr(transparent)]
        pub struct IShape(hashbridge_abi::system::Object);

        impl ::std::ops::Deref for IShape {
            type Target = hashbridge_abi::system::Object;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl hashbridge_abi::ObjectHash for IShape {
            fn type_id() -> hashbridge_abi::TypeId {
                hashbridge_abi::TypeId::from_raw(0x1ee158696343a04a)
            }
        }

        impl hashbridge_abi::FromObject for IShape {
            unsafe fn from_object_unchecked(object: hashbridge_abi::system::Object) -> Self {
                Self(object)
            }
        }

        impl IShape {
            /// Ask the host for a new instance.
            pub fn new() -> hashbridge_abi::InteropResult<Self> {
                let init = hashbridge_abi::ObjectInit::empty(<Self as hashbridge_abi::ObjectHash>::type_id());
                hashbridge_abi::boundary::construct(&init)?.downcast()
            }
        }

        // impl Host.Shapes.IShape
        impl IShape {
            /// `get_Name()`
            pub fn get_name(&self) -> hashbridge_abi::InteropResult<::std::option::Option<hashbridge_abi::system::String>> {
                const METHOD: hashbridge_abi::MethodId = hashbridge_abi::MethodId::from_raw(0xf7232adb3040301a);
                let ty = <Self as hashbridge_abi::ObjectHash>::type_id();
                hashbridge_abi::boundary::call_function(ty, METHOD, self.0.handle())?.downcast_nullable()
            }
        }

        /// `Host.Shapes.ISquare`
        #[repr(transparent)]
        pub struct ISquare(hashbridge_abi::system::Object);

        impl ::std::ops::Deref for ISquare {
            type Target = hashbridge_abi::system::Object;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl hashbridge_abi::ObjectHash for ISquare {
            fn type_id() -> hashbridge_abi::TypeId {
                hashbridge_abi::TypeId::from_raw(0xbcbec4be5620ce58)
            }
        }

        impl hashbridge_abi::FromObject for ISquare {
            unsafe fn from_object_unchecked(object: hashbridge_abi::system::Object) -> Self {
                Self(object)
            }
        }

        impl ISquare {
            /// Ask the host for a new instance.
            pub fn new() -> hashbridge_abi::InteropResult<Self> {
                let init = hashbridge_abi::ObjectInit::empty(<Self as hashbridge_abi::ObjectHash>::type_id());
                hashbridge_abi::boundary::construct(&init)?.downcast()
            }
        }

        // impl Host.Shapes.ISquare
        impl ISquare {
            /// `Area()`
            pub fn area(&self) -> hashbridge_abi::InteropResult<hashbridge_abi::system::Double> {
                const METHOD: hashbridge_abi::MethodId = hashbridge_abi::MethodId::from_raw(0x73991e2295930059);
                let ty = <Self as hashbridge_abi::ObjectHash>::type_id();
                hashbridge_abi::boundary::call_function(ty, METHOD, self.0.handle())?.downcast()
            }

            /// `Scale(System.Double)`
            pub fn scale(&self, factor: &hashbridge_abi::system::Double) -> hashbridge_abi::InteropResult<()> {
                const METHOD: hashbridge_abi::MethodId = hashbridge_abi::MethodId::from_raw(0xb574fa9d63dee8e3);
                let ty = <Self as hashbridge_abi::ObjectHash>::type_id();
                hashbridge_abi::boundary::push_parameter(ty, METHOD, hashbridge_abi::system::Object::handle(factor))?;
                drop(hashbridge_abi::boundary::call_function(ty, METHOD, self.0.handle())?);
                Ok(())
            }

            /// `Fail()`
            pub fn fail(&self) -> hashbridge_abi::InteropResult<hashbridge_abi::system::Int32> {
                const METHOD: hashbridge_abi::MethodId = hashbridge_abi::MethodId::from_raw(0xc5911df39babc23a);
                let ty = <Self as hashbridge_abi::ObjectHash>::type_id();
                hashbridge_abi::boundary::call_function(ty, METHOD, self.0.handle())?.downcast()
            }

            /// `Find(System.String)`
            pub fn find(&self, name: &hashbridge_abi::system::String) -> hashbridge_abi::InteropResult<::std::option::Option<crate::host::shapes::ISquare>> {
                const METHOD: hashbridge_abi::MethodId = hashbridge_abi::MethodId::from_raw(0x3fd4c608deb63b9f);
                let ty = <Self as hashbridge_abi::ObjectHash>::type_id();
                hashbridge_abi::boundary::push_parameter(ty, METHOD, hashbridge_abi::system::Object::handle(name))?;
                hashbridge_abi::boundary::call_function(ty, METHOD, self.0.handle())?.downcast_nullable()
            }
        }

        // impl Host.Shapes.IShape
        impl ISquare {
            /// `get_Name()`
            pub fn get_name(&self) -> hashbridge_abi::InteropResult<::std::option::Option<hashbridge_abi::system::String>> {
                const METHOD: hashbridge_abi::MethodId = hashbridge_abi::MethodId::from_raw(0xf7232adb3040301a);
                let ty = <Self as hashbridge_abi::ObjectHash>::type_id();
                hashbridge_abi::boundary::call_function(ty, METHOD, self.0.handle())?.downcast_nullable()
            }
        }
    }
}
