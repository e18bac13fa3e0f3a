//! Project templates
//!
//! Fixed file contents written by `tsbuild create`. The generated project
//! builds with `tsbuild build`, tests with Jest, and lints with ESLint.

use serde_json::{json, Value};

/// Dev dependencies installed into a freshly scaffolded project. The Rollup
/// and Babel toolchain is installed project-locally because the build
/// command drives it through the project's own node_modules.
pub const TEMPLATE_DEPENDENCIES: &[&str] = &[
    "@babel/core",
    "@babel/plugin-transform-class-properties",
    "@babel/plugin-transform-runtime",
    "@babel/preset-env",
    "@babel/runtime",
    "@eslint/js",
    "@rollup/plugin-babel",
    "@rollup/plugin-commonjs",
    "@rollup/plugin-json",
    "@rollup/plugin-node-resolve",
    "@rollup/plugin-replace",
    "@rollup/plugin-terser",
    "@size-limit/preset-small-lib",
    "@types/jest",
    "babel-plugin-annotate-pure-calls",
    "babel-plugin-dev-expression",
    "babel-plugin-macros",
    "babel-plugin-polyfill-regenerator",
    "babel-plugin-transform-rename-import",
    "eslint",
    "husky",
    "jest",
    "jest-watch-typeahead",
    "lint-staged",
    "prettier",
    "rollup",
    "rollup-plugin-copy",
    "rollup-plugin-peer-deps-external",
    "rollup-plugin-typescript2",
    "size-limit",
    "ts-jest",
    "tslib",
    "typescript",
    "typescript-eslint",
];

/// Node requirement enforced before dependency installation
pub const NODE_ENGINE_REQUIREMENT: &str = ">=14";

pub const GITIGNORE: &str = "
*.log
.DS_Store
node_modules
dist
";

pub const TSCONFIG: &str = r#"{
  // see https://www.typescriptlang.org/tsconfig to better understand tsconfigs
  "include": ["src", "types"],
  "compilerOptions": {
    "module": "esnext",
    "lib": ["dom", "esnext"],
    "importHelpers": true,
    // output .js.map sourcemap files for consumers
    "sourceMap": true,
    // match output dir to input dir. e.g. dist/index instead of dist/src/index
    "rootDir": "./src",
    "strict": true,
    "noImplicitReturns": true,
    "noFallthroughCasesInSwitch": true,
    "noUnusedLocals": true,
    "noUnusedParameters": true,
    "moduleResolution": "node",
    "jsx": "react",
    "esModuleInterop": true,
    "skipLibCheck": true,
    "forceConsistentCasingInFileNames": true,
    "noEmit": true
  }
}
"#;

pub const README: &str = "
# Package documentation
";

/// MIT license with `<year>` and `<author>` placeholders substituted at
/// scaffold time
pub const LICENSE: &str = r#"MIT License

Copyright (c) <year> <author>

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
"#;

pub const JEST_CONFIG: &str = r#"module.exports = {
  transform: {
    '.(ts|tsx)$': require.resolve('ts-jest/dist'),
    '.(js|jsx)$': require.resolve('babel-jest'), // jest's default
  },
  transformIgnorePatterns: ['[/\\\\]node_modules[/\\\\].+\\.(js|jsx)$'],
  moduleFileExtensions: ['ts', 'tsx', 'js', 'jsx', 'json', 'node'],
  collectCoverageFrom: ['src/**/*.{ts,tsx,js,jsx}'],
  testMatch: ['<rootDir>/tests/**/*.(spec|test).{ts,tsx,js,jsx}'],
  testEnvironmentOptions: {
    url: 'http://localhost'
  },
  watchPlugins: [
    require.resolve('jest-watch-typeahead/filename'),
    require.resolve('jest-watch-typeahead/testname'),
  ],
};
"#;

pub const ESLINT_CONFIG: &str = r#"// @ts-check
import eslint from "@eslint/js";
import tseslint from "typescript-eslint";

export default tseslint.config(
  eslint.configs.recommended,
  tseslint.configs.recommended,
  {
    ignores: [
      "test/**/*.test.ts",
      "test/**/*.spec.ts",
      "src/**/*.test.ts",
      "dist/",
      "build/",
      "lib/",
      "node_modules/",
      "coverage/",
      "**/*.d.ts",
    ],
  }
);
"#;

pub const BABEL_CONFIG: &str = r#"{
  "presets": [
    "@babel/preset-env",
    "@babel/preset-typescript"
  ],
  "plugins": [
    "@babel/plugin-transform-class-properties"
  ]
}
"#;

pub const SAMPLE_SOURCE: &str = "
export const SayHello = (name: string) => `Hello, ${name}`;
";

pub const SAMPLE_TEST: &str = "
import { SayHello } from '../src';

describe('SayHello Tests', () => {
  it('Greet the user provided name', () => {
    expect(SayHello('Bertrand')).toEqual('Hello, Bertrand');
  });
});
";

pub const WORKFLOW_MAIN: &str = r#"# Build, lint, and publish the package when a release lands on master
name: Deployment

on:
  push:
    branches:
      - master

jobs:
  build:
    name: Build, lint, and test on Node ${{ matrix.node }} and ${{ matrix.os }}

    runs-on: ${{ matrix.os }}
    strategy:
      matrix:
        node: ['16.x', '18.x', '20.x', '22.x']
        os: [ubuntu-latest, windows-latest, macOS-latest]

    steps:
      - name: Checkout repo
        uses: actions/checkout@v3

      - name: Use Node ${{ matrix.node }}
        uses: actions/setup-node@v3
        with:
          node-version: ${{ matrix.node }}

      - name: Install deps and build (with cache)
        uses: bahmutov/npm-install@v1
        with:
          useLockFile: false

      - name: Lint
        run: npm run lint
    env:
      NODE_AUTH_TOKEN: ${{secrets.GITHUB_TOKEN}}

  publish-gpr:
    needs: build
    runs-on: ubuntu-latest
    permissions:
      contents: read
      packages: write
    steps:
      - uses: actions/checkout@v3
      - uses: actions/setup-node@v3
        with:
          node-version: 20
          registry-url: https://npm.pkg.github.com/

      - name: Install deps
        uses: bahmutov/npm-install@v1
        with:
          useLockFile: false

      - name: Build
        run: npm run build

      - run: npm publish
    env:
      NODE_AUTH_TOKEN: ${{secrets.GITHUB_TOKEN}}
"#;

pub const WORKFLOW_SIZE: &str = r#"name: size
on: [pull_request]
jobs:
  size:
    runs-on: ubuntu-latest
    steps:
      - name: Checkout repo
        uses: actions/checkout@v2

      - name: Use Node
        uses: actions/setup-node@v1
        with:
          node-version: 20

      - name: Install deps
        uses: bahmutov/npm-install@v1
        with:
          useLockFile: false

      - name: Build
        run: npm run build

      - run: npm run size

    env:
      CI_JOB_NUMBER: 1
      NODE_AUTH_TOKEN: ${{secrets.GITHUB_TOKEN}}
"#;

pub const LINT_STAGED_CONFIG: &str = r#"module.exports = {
  '*.{ts,js}': ['prettier --write', 'eslint --fix'],
  '*.html': ['prettier --write', 'eslint'],
  '*.{json,md,css}': ['prettier --write'],
};
"#;

pub const PRECOMMIT_HOOK: &str = r#"#!/bin/sh

npx lint-staged
tsbuild build
"#;

pub const NPMRC: &str = r#"//npm.pkg.github.com/:_authToken=${NODE_AUTH_TOKEN}
"#;

/// Compose the scaffolded project's package.json
pub fn compose_package_json(name: &str, author: &str) -> Value {
    json!({
        "name": name,
        "author": author,
        "version": "0.1.0",
        "license": "MIT",
        "main": "dist/index.js",
        "module": "dist/esm/index.mjs",
        "typings": "dist/types/index.d.ts",
        "source": "src/index.ts",
        "files": ["dist/**/*"],
        "engines": {
            "node": NODE_ENGINE_REQUIREMENT,
        },
        "scripts": {
            "build": "tsbuild build",
            "lint": "tsbuild lint",
            "prepare": "git config core.hookspath .githooks && tsbuild build",
            "size": "size-limit",
            "analyze": "size-limit --why",
            "test": "jest",
            "prettier": "prettier --write src/**/*",
        },
        "husky": {
            "hooks": {
                "pre-commit": "eslint",
            },
        },
        "prettier": {
            "printWidth": 80,
            "semi": true,
            "singleQuote": true,
            "trailingComma": "es5",
        },
        "exports": {
            ".": {
                "import": "./dist/esm/index.mjs",
                "require": "./dist/cjs/index.cjs",
                "default": "./dist/cjs/index.cjs",
            },
        },
        "size-limit": [
            {
                "path": "dist/cjs/index.cjs",
                "limit": "10 KB",
            },
            {
                "path": "dist/esm/index.mjs",
                "limit": "10 KB",
            },
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_package_json_fields() {
        let pkg = compose_package_json("my-lib", "Jane Doe");
        assert_eq!(pkg["name"], "my-lib");
        assert_eq!(pkg["author"], "Jane Doe");
        assert_eq!(pkg["scripts"]["build"], "tsbuild build");
        assert_eq!(pkg["exports"]["."]["require"], "./dist/cjs/index.cjs");
        assert_eq!(pkg["size-limit"][0]["path"], "dist/cjs/index.cjs");
        assert_eq!(pkg["engines"]["node"], NODE_ENGINE_REQUIREMENT);
    }

    #[test]
    fn test_template_dependencies_include_toolchain() {
        assert!(TEMPLATE_DEPENDENCIES.contains(&"rollup"));
        assert!(TEMPLATE_DEPENDENCIES.contains(&"@babel/runtime"));
        assert!(TEMPLATE_DEPENDENCIES.contains(&"typescript"));
    }
}
